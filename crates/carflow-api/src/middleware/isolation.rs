//! # Tenant Isolation
//!
//! Wraps the rest of the request in an isolation scope for the caller's
//! tenant. The scope is recorded on the [`RequestContext`] so handlers can
//! correlate their storage work with it.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use carflow_auth::AuthenticationError;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::middleware::record_denial;
use crate::state::AppState;

/// Isolation stage.
pub async fn isolation_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(tenant) = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.tenant_id().clone())
    else {
        record_denial("unauthenticated");
        return AppError::Unauthenticated(AuthenticationError::Missing).into_response();
    };

    let scoped = state
        .scopes
        .with_scope(tenant, |scope| {
            if let Some(ctx) = request.extensions_mut().get_mut::<RequestContext>() {
                ctx.set_scope(scope);
            }
            next.run(request)
        })
        .await;

    match scoped {
        Ok(response) => response,
        Err(err) => {
            record_denial("isolation");
            AppError::from(err).into_response()
        }
    }
}
