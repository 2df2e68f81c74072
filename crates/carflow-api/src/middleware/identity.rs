//! # Request Identity Extraction
//!
//! Reads `Authorization: Bearer <credential>`, validates it as an access
//! credential and injects a [`RequestContext`] for the stages and handler
//! below. Any failure short-circuits with 401; nothing downstream runs.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use carflow_auth::AuthenticationError;
use carflow_core::CredentialKind;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::middleware::record_denial;
use crate::state::AppState;

/// The bearer credential in `headers`.
///
/// # Errors
///
/// [`AuthenticationError::Missing`] when the header is absent, not valid
/// UTF-8, not the `Bearer` scheme, or carries an empty credential.
pub fn bearer_credential(headers: &HeaderMap) -> Result<&str, AuthenticationError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthenticationError::Missing)?;
    let (scheme, credential) = value.split_once(' ').ok_or(AuthenticationError::Missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthenticationError::Missing);
    }
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AuthenticationError::Missing);
    }
    Ok(credential)
}

/// Identity stage.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = bearer_credential(request.headers())
        .and_then(|credential| state.validator.validate(credential, CredentialKind::Access));

    match principal {
        Ok(principal) => {
            tracing::debug!(
                user_id = %principal.user_id(),
                tenant_id = %principal.tenant_id(),
                "request authenticated"
            );
            request
                .extensions_mut()
                .insert(RequestContext::new(principal));
            next.run(request).await
        }
        Err(err) => {
            record_denial("unauthenticated");
            AppError::Unauthenticated(err).into_response()
        }
    }
}
