//! # Credential Refresh
//!
//! `POST /auth/refresh` trades a renewal credential for a fresh access
//! credential. It carries no access credential, so it sits outside the
//! admission chain; every refusal is the same 401.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Refresh request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// Renewal credential.
    pub refresh_token: String,
}

/// Refresh response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    /// New access credential.
    pub token: String,
    /// Expiry of the new credential.
    pub expires_at: DateTime<Utc>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new().route("/auth/refresh", post(refresh))
}

/// POST /auth/refresh: Mint an access credential from a renewal credential.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access credential", body = RefreshResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid credential", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, AppError> {
    let req = extract_json(body)?;
    let issued = state.validator.refresh(&req.refresh_token)?;
    tracing::debug!("access credential refreshed");
    Ok(Json(RefreshResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}
