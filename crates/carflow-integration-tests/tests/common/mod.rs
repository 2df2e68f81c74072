//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use http_body_util::BodyExt;

use carflow_api::config::AppConfig;
use carflow_api::AppState;
use carflow_auth::{CredentialSecret, IdentityClaims};
use carflow_core::{CredentialKind, Plan, Role, TenantId, UserId};
use carflow_tenancy::{InMemorySessionBinder, InMemoryTenantDirectory, Tenant};

pub struct TestEnv {
    pub state: AppState,
    pub binder: Arc<InMemorySessionBinder>,
    pub directory: Arc<InMemoryTenantDirectory>,
}

pub fn config() -> AppConfig {
    AppConfig::with_secrets(
        CredentialSecret::new("access", "integration-access-secret").unwrap(),
        CredentialSecret::new("refresh", "integration-refresh-secret").unwrap(),
    )
}

/// Tenants T1 (120/min) and T2 (pro plan defaults).
pub fn env() -> TestEnv {
    env_with(config())
}

pub fn env_with(config: AppConfig) -> TestEnv {
    let directory = Arc::new(InMemoryTenantDirectory::with_tenants([
        Tenant::new(tenant("T1"), "Tenant One", Plan::Basic).with_rate_limit(120),
        Tenant::new(tenant("T2"), "Tenant Two", Plan::Pro),
    ]));
    let binder = Arc::new(InMemorySessionBinder::new());
    let state = AppState::new(config, directory.clone(), binder.clone()).unwrap();
    TestEnv {
        state,
        binder,
        directory,
    }
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

pub fn token(state: &AppState, tenant_id: &str, role: Role, kind: CredentialKind) -> String {
    let identity = IdentityClaims {
        user_id: UserId::new(format!("user-of-{tenant_id}")).unwrap(),
        email: format!("ops@{tenant_id}.example"),
        tenant_id: tenant(tenant_id),
        role,
    };
    state.validator.issue(&identity, kind).unwrap().token
}

pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().uri(uri);
    if let Some(t) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
