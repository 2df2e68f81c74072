//! # OpenAPI Document Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI 3.1 document,
//! served at `/openapi.json` outside the admission pipeline.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer credential scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access credential issued by the CarFlow API."))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI document for the CarFlow API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CarFlow API",
        version = "0.1.0",
        description = "Multi-tenant API for vehicle rental operators.\n\nEvery `/v1/*` route passes the admission pipeline: bearer credential validation, per-tenant rate limiting (429 with `Retry-After`), and a tenant isolation scope. `/auth/*` routes are limited per client address."
    ),
    servers((url = "http://localhost:8080", description = "Local development server")),
    paths(
        crate::routes::auth::refresh,
        crate::routes::identity::me,
        crate::routes::tenants::get_tenant,
        crate::routes::admin::rate_limits,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::auth::RefreshRequest,
        crate::routes::auth::RefreshResponse,
        crate::routes::identity::MeResponse,
        crate::routes::tenants::TenantResponse,
        crate::routes::admin::LimiterStats,
        crate::routes::admin::RateLimitStats,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Credential renewal"),
        (name = "identity", description = "Current principal"),
        (name = "tenants", description = "Tenant configuration"),
        (name = "admin", description = "Operator introspection"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
