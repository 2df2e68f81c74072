//! # Admin Introspection
//!
//! `GET /v1/admin/rate-limits`: live bucket counts of both limiters.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use carflow_core::Role;

use crate::context::{require_role, RequestContext};
use crate::error::AppError;
use crate::state::AppState;

/// Snapshot of one limiter.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LimiterStats {
    /// Limiter label used in metrics.
    pub name: String,
    /// Buckets currently live.
    pub buckets: usize,
    /// Buckets created since start.
    pub created: u64,
}

/// Snapshot of both limiters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RateLimitStats {
    /// Per-tenant limiter on admitted routes.
    pub tenant: LimiterStats,
    /// Per-client-address limiter on public routes.
    pub client: LimiterStats,
}

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/admin/rate-limits", get(rate_limits))
}

/// GET /v1/admin/rate-limits: Limiter statistics. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/rate-limits",
    responses(
        (status = 200, description = "Limiter statistics", body = RateLimitStats),
        (status = 403, description = "Not an admin", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn rate_limits(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<RateLimitStats>, AppError> {
    require_role(&ctx, Role::Admin)?;
    Ok(Json(RateLimitStats {
        tenant: LimiterStats {
            name: state.tenant_limiter.name().to_string(),
            buckets: state.tenant_limiter.len(),
            created: state.tenant_limiter.created_count(),
        },
        client: LimiterStats {
            name: state.client_limiter.name().to_string(),
            buckets: state.client_limiter.len(),
            created: state.client_limiter.created_count(),
        },
    }))
}
