//! # Request Context
//!
//! Every request admitted by the identity stage carries a [`RequestContext`]
//! in its extensions. The isolation stage adds the open scope. Handlers
//! take it as an extractor; nothing is read from globals or task-locals.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use carflow_core::{Principal, Role, TenantId};
use carflow_tenancy::IsolationScope;

use crate::error::AppError;

/// Identity and isolation scope of one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    principal: Principal,
    scope: Option<IsolationScope>,
}

impl RequestContext {
    /// Context for an authenticated principal with no scope open yet.
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            scope: None,
        }
    }

    /// The authenticated caller.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The caller's tenant.
    pub fn tenant_id(&self) -> &TenantId {
        self.principal.tenant_id()
    }

    /// The open isolation scope, once the isolation stage has run.
    pub fn scope(&self) -> Option<&IsolationScope> {
        self.scope.as_ref()
    }

    pub(crate) fn set_scope(&mut self, scope: IsolationScope) {
        self.scope = Some(scope);
    }
}

/// Extracts the context the identity stage injected into extensions.
/// Returns 401 if it is absent (the route is not behind the identity stage).
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(AppError::Unauthenticated(
                carflow_auth::AuthenticationError::Missing,
            ))
    }
}

/// Check that the caller has at least the required role.
/// Returns 403 Forbidden if the caller's role is insufficient.
pub fn require_role(ctx: &RequestContext, minimum: Role) -> Result<(), AppError> {
    if ctx.principal.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            ctx.principal.role().as_str()
        )))
    }
}

/// Check that the caller may act on `tenant`: its own tenant, or any
/// tenant for admins.
pub fn require_tenant(ctx: &RequestContext, tenant: &TenantId) -> Result<(), AppError> {
    if ctx.principal.can_access_tenant(tenant) {
        Ok(())
    } else {
        Err(AppError::Forbidden("access to this tenant is not allowed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carflow_core::{CredentialKind, UserId};
    use chrono::Utc;

    fn ctx(tenant: &str, role: Role) -> RequestContext {
        RequestContext::new(Principal::new(
            UserId::new("u1").unwrap(),
            "u1@carflow.com",
            TenantId::new(tenant).unwrap(),
            role,
            CredentialKind::Access,
            Utc::now(),
        ))
    }

    #[test]
    fn role_guard() {
        assert!(require_role(&ctx("T1", Role::Admin), Role::Admin).is_ok());
        assert!(require_role(&ctx("T1", Role::User), Role::User).is_ok());
        let err = require_role(&ctx("T1", Role::User), Role::Admin).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m.contains("admin")));
    }

    #[test]
    fn tenant_guard() {
        let t1 = TenantId::new("T1").unwrap();
        let t2 = TenantId::new("T2").unwrap();
        assert!(require_tenant(&ctx("T1", Role::User), &t1).is_ok());
        assert!(require_tenant(&ctx("T1", Role::User), &t2).is_err());
        assert!(require_tenant(&ctx("T1", Role::Admin), &t2).is_ok());
    }

    #[test]
    fn scope_starts_empty() {
        let mut c = ctx("T1", Role::User);
        assert!(c.scope().is_none());
        c.set_scope(IsolationScope::new(TenantId::new("T1").unwrap()));
        assert_eq!(c.scope().unwrap().tenant_id().as_str(), "T1");
    }
}
