//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every pipeline stage and handler reports failure through [`AppError`], so
//! all error responses share one envelope:
//!
//! ```json
//! { "error": { "code": "RATE_LIMITED", "message": "rate limit exceeded" } }
//! ```
//!
//! Authentication failures always carry the same message. 500-class
//! messages are logged and replaced before they reach the caller.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use carflow_auth::{AuthError, AuthenticationError};
use carflow_ratelimit::RateLimitError;
use carflow_tenancy::{DirectoryError, IsolationError};

/// Message returned for every 500-class error.
pub const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "UNAUTHORIZED", "RATE_LIMITED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Envelope with no details.
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// The credential was missing or refused (401).
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthenticationError),

    /// The caller is authenticated but not allowed (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The tenant exhausted its budget (429).
    #[error("rate limited; retry after {retry_after}s")]
    RateLimited {
        /// Seconds until the caller should retry.
        retry_after: u64,
    },

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Deployment or tenant configuration problem (500).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Unauthenticated(err) => err.public_message().to_string(),
            Self::Forbidden(msg) => msg.clone(),
            Self::RateLimited { .. } => "rate limit exceeded".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
            Self::Configuration(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    fn log(&self) {
        match self {
            Self::Unauthenticated(err) => {
                tracing::debug!(reason = err.reason(), error = %err, "authentication failed")
            }
            Self::Forbidden(msg) => tracing::info!(reason = %msg, "authorization denied"),
            Self::RateLimited { retry_after } => {
                tracing::info!(retry_after, "rate limit exceeded")
            }
            Self::Configuration(_) => tracing::error!(error = %self, "configuration error"),
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::NotFound(_) | Self::BadRequest(_) => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        self.log();

        let mut body = ErrorBody::new(code, self.public_message());
        if let Self::RateLimited { retry_after } = self {
            body.error.details = Some(serde_json::json!({ "retry_after": retry_after }));
        }

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Authentication(e) => Self::Unauthenticated(e),
            AuthError::Credential(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Budget lookup failures are tenant configuration problems.
impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<IsolationError> for AppError {
    fn from(err: IsolationError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UnknownTenant(id) => Self::NotFound(format!("tenant {id}")),
            DirectoryError::Unavailable(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<carflow_core::ValidationError> for AppError {
    fn from(err: carflow_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
