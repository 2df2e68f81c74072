//! # Credential Claims
//!
//! Wire layout of the signed credential body:
//!
//! ```text
//! { user_id, email, role, tenant_id, type, iat, nbf, exp, iss, sub }
//! ```

use carflow_core::{CredentialKind, Principal, Role, TenantId, UserId};
use serde::{Deserialize, Serialize};

/// Issuer stamped on and required of every credential.
pub const ISSUER: &str = "carflow-api";

/// Identity fields a credential asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Authenticated user.
    pub user_id: UserId,
    /// User email.
    pub email: String,
    /// Tenant the user belongs to.
    pub tenant_id: TenantId,
    /// User role.
    pub role: Role,
}

impl From<&Principal> for IdentityClaims {
    fn from(p: &Principal) -> Self {
        Self {
            user_id: p.user_id().clone(),
            email: p.email().to_string(),
            tenant_id: p.tenant_id().clone(),
            role: p.role(),
        }
    }
}

/// Full claim set as serialized into the token.
///
/// Identifier fields deserialize through their validating newtypes, so a
/// correctly signed token with an empty tenant id is still malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Authenticated user.
    pub user_id: UserId,
    /// User email.
    pub email: String,
    /// User role.
    pub role: Role,
    /// Tenant the user belongs to.
    pub tenant_id: TenantId,
    /// Kind tag.
    #[serde(rename = "type")]
    pub kind: CredentialKind,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Not-before, seconds since the epoch.
    pub nbf: i64,
    /// Expires-at, seconds since the epoch.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Subject; always the user id.
    pub sub: String,
}

impl CredentialClaims {
    /// Claims for `identity` valid from `now` until `exp`.
    pub fn new(identity: &IdentityClaims, kind: CredentialKind, now: i64, exp: i64) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            tenant_id: identity.tenant_id.clone(),
            kind,
            iat: now,
            nbf: now,
            exp,
            iss: ISSUER.to_string(),
            sub: identity.user_id.as_str().to_string(),
        }
    }

    /// The identity portion of the claims.
    pub fn identity(&self) -> IdentityClaims {
        IdentityClaims {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            tenant_id: self.tenant_id.clone(),
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_serialize_with_type_tag() {
        let identity = IdentityClaims {
            user_id: UserId::new("u1").unwrap(),
            email: "u1@carflow.com".into(),
            tenant_id: TenantId::new("t1").unwrap(),
            role: Role::User,
        };
        let claims = CredentialClaims::new(&identity, CredentialKind::Renewal, 100, 200);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
        assert_eq!(json["tenant_id"], "t1");
        assert_eq!(json["sub"], "u1");
        assert_eq!(json["iss"], ISSUER);
        assert_eq!(json["nbf"], 100);
    }
}
