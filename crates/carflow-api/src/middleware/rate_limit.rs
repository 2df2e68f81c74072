//! # Rate Limiting
//!
//! Two stages over the generic registry:
//!
//! - [`tenant_rate_limit_middleware`] keys on the authenticated tenant and
//!   runs after identity.
//! - [`client_rate_limit_middleware`] keys on the peer address and guards
//!   the unauthenticated routes.
//!
//! A denial is a 429 with `Retry-After`. A budget that cannot be resolved
//! (unknown tenant, zero budget) is a 500 configuration error.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use carflow_auth::AuthenticationError;
use carflow_ratelimit::Decision;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::middleware::record_denial;
use crate::state::AppState;

/// Tenant rate limit stage.
pub async fn tenant_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
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

    match state.tenant_limiter.acquire(&tenant).await {
        Ok(Decision::Allowed { .. }) => next.run(request).await,
        Ok(Decision::Denied { retry_after }) => {
            record_denial("rate_limited");
            tracing::info!(tenant_id = %tenant, retry_after, "tenant rate limit exceeded");
            AppError::RateLimited { retry_after }.into_response()
        }
        Err(err) => {
            record_denial("configuration");
            AppError::from(err).into_response()
        }
    }
}

/// Client-address rate limit stage.
///
/// Requests without connection info (e.g. routers driven in-process) are
/// not limited.
pub async fn client_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(addr) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0)
    else {
        return next.run(request).await;
    };

    match state.client_limiter.acquire(&addr.ip()).await {
        Ok(Decision::Allowed { .. }) => next.run(request).await,
        Ok(Decision::Denied { retry_after }) => {
            record_denial("rate_limited");
            tracing::info!(client = %addr.ip(), retry_after, "client rate limit exceeded");
            AppError::RateLimited { retry_after }.into_response()
        }
        Err(err) => {
            record_denial("configuration");
            AppError::from(err).into_response()
        }
    }
}
