//! # Current Principal
//!
//! `GET /v1/me` echoes the admitted request's context. It is the smallest
//! handler that observes all three admission stages.

use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::state::AppState;

/// The caller as seen by a handler.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    /// Authenticated user.
    pub user_id: String,
    /// Email carried by the credential.
    pub email: String,
    /// Tenant the request was admitted for.
    pub tenant_id: String,
    /// Role name, e.g. `admin`.
    pub role: String,
    /// When the access credential expires.
    pub expires_at: DateTime<Utc>,
    /// Isolation scope the handler ran in.
    pub scope_id: Option<Uuid>,
}

/// Build the identity router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/me", get(me))
}

/// GET /v1/me: Current principal and isolation scope.
#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "Invalid credential", body = crate::error::ErrorBody),
        (status = 429, description = "Tenant rate limit exceeded", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "identity"
)]
pub async fn me(ctx: RequestContext) -> Json<MeResponse> {
    let p = ctx.principal();
    Json(MeResponse {
        user_id: p.user_id().to_string(),
        email: p.email().to_string(),
        tenant_id: p.tenant_id().to_string(),
        role: p.role().to_string(),
        expires_at: p.expires_at(),
        scope_id: ctx.scope().map(|s| s.id()),
    })
}
