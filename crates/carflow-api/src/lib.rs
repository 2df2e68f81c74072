//! # carflow-api: Admission Pipeline and HTTP Surface
//!
//! Assembles the CarFlow API router on Axum/Tower/Tokio. Every protected
//! request passes three admission stages before a handler sees it:
//!
//! ```text
//! identity → tenant rate limit → isolation scope → handler
//! ```
//!
//! Around the whole router sit tracing, panic containment and CORS:
//!
//! ```text
//! TraceLayer → CatchPanicLayer → CorsLayer → (admission) → handler
//! ```
//!
//! ## Routes
//!
//! - `/v1/*`: protected; full admission pipeline.
//! - `/auth/*`: public; limited per client address.
//! - `/health/*`, `/openapi.json`: unauthenticated, unlimited.
//!
//! ## Crate Policy
//!
//! - No admission logic in handlers; they read the [`RequestContext`].
//! - All errors map to one JSON envelope via [`AppError`].

pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

pub use config::AppConfig;
pub use context::RequestContext;
pub use error::AppError;
pub use state::AppState;

use middleware::{cors, identity, isolation, rate_limit, recovery, tracing_layer};

/// Build the application router.
pub fn app(state: AppState) -> Router {
    app_with(state, Router::new())
}

/// Build the application router with `extra` mounted next to the `/v1`
/// routes, behind the same admission pipeline.
pub fn app_with(state: AppState, extra: Router<AppState>) -> Router {
    let protected = admitted(
        Router::new()
            .merge(routes::identity::router())
            .merge(routes::tenants::router())
            .merge(routes::admin::router())
            .merge(extra),
        &state,
    );

    let public = routes::auth::router().route_layer(from_fn_with_state(
        state.clone(),
        rate_limit::client_rate_limit_middleware,
    ));

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router());

    Router::new()
        .merge(protected)
        .merge(public)
        .merge(unauthenticated)
        .layer(cors::layer(&state.config))
        .layer(CatchPanicLayer::custom(recovery::panic_response))
        .layer(tracing_layer::layer())
        .with_state(state)
}

/// Put `router` behind the admission stages.
///
/// Layers added later wrap earlier ones, so identity is added last to run
/// first. Unmatched paths never reach the stages.
fn admitted(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router
        .route_layer(from_fn_with_state(
            state.clone(),
            isolation::isolation_middleware,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            rate_limit::tenant_rate_limit_middleware,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            identity::identity_middleware,
        ))
}

/// Liveness check: the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: the process can serve traffic.
async fn readiness() -> &'static str {
    "ready"
}
