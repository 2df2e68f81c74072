//! # carflow-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment;
//! see [`carflow_api::config`].

use std::net::SocketAddr;
use std::sync::Arc;

use carflow_api::config::{AppConfig, LogFormat};
use carflow_api::AppState;
use carflow_core::{Plan, TenantId};
use carflow_tenancy::{InMemorySessionBinder, InMemoryTenantDirectory, Tenant};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before config loading, so its warnings are visible.
    init_tracing(LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()));

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration failed: {e}");
        e
    })?;

    let directory = Arc::new(InMemoryTenantDirectory::with_tenants(config.load_tenants()?));
    if directory.is_empty() && config.is_development() {
        tracing::warn!("no tenants configured; seeding tenant 'demo' for development");
        directory.insert(Tenant::new(TenantId::new("demo")?, "Demo Rentals", Plan::Basic));
    }
    tracing::info!(tenants = directory.len(), "tenant directory loaded");

    let binder = Arc::new(InMemorySessionBinder::new());
    let port = config.port;
    let state = AppState::new(config, directory, binder)?;
    let sweepers = state.spawn_sweepers();

    let app = carflow_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("CarFlow API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweepers.shutdown().await;
    tracing::info!("CarFlow API stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
