//! # Panic Containment
//!
//! Handler for `tower_http::catch_panic::CatchPanicLayer`. Any panic below
//! the layer becomes a generic 500 envelope; the payload is logged, never
//! returned.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{ErrorBody, INTERNAL_MESSAGE};
use crate::middleware::record_denial;

/// Turn a caught panic payload into a 500 response.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "non-string panic payload"
    };
    tracing::error!(panic = %detail, "request handler panicked");
    record_denial("panic");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("INTERNAL_ERROR", INTERNAL_MESSAGE)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn payload_is_not_leaked() {
        let response = panic_response(Box::new(String::from("secret table name")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert_eq!(body.error.message, INTERNAL_MESSAGE);
        assert!(!String::from_utf8_lossy(&bytes).contains("secret"));
    }

    #[test]
    fn non_string_payload_handled() {
        let response = panic_response(Box::new(42u32));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
