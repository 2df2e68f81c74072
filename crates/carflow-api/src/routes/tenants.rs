//! # Tenant Lookup
//!
//! `GET /v1/tenants/{tenant_id}`: a tenant-scoped read. Callers see their
//! own tenant; admins see any.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use carflow_core::TenantId;
use carflow_tenancy::Tenant;

use crate::context::{require_tenant, RequestContext};
use crate::error::AppError;
use crate::state::AppState;

/// Public view of a tenant record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
    /// Tenant id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Subscription plan.
    pub plan: String,
    /// Lifecycle status, e.g. `active`.
    pub status: String,
    /// API budget in requests per minute.
    pub api_rate_limit: u32,
}

impl From<Tenant> for TenantResponse {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name,
            plan: t.plan.as_str().to_string(),
            status: t.status.as_str().to_string(),
            api_rate_limit: t.limits.api_rate_limit,
        }
    }
}

/// Build the tenants router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/tenants/{tenant_id}", get(get_tenant))
}

/// GET /v1/tenants/{tenant_id}: Tenant configuration.
#[utoipa::path(
    get,
    path = "/v1/tenants/{tenant_id}",
    params(("tenant_id" = String, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Tenant", body = TenantResponse),
        (status = 403, description = "Other tenant", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown tenant", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(tenant_id): Path<String>,
) -> Result<Json<TenantResponse>, AppError> {
    let tenant_id = TenantId::new(tenant_id)?;
    require_tenant(&ctx, &tenant_id)?;
    let tenant = state.directory.tenant(&tenant_id).await?;
    Ok(Json(tenant.into()))
}
