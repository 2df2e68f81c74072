//! # Application State
//!
//! Shared state for the Axum application, passed to middleware and route
//! handlers via the `State` extractor.
//!
//! Everything here is created once at server start and shared by
//! reference. The only mutable shared state is inside the two rate limiter
//! registries.

use std::net::IpAddr;
use std::sync::Arc;

use carflow_auth::CredentialValidator;
use carflow_core::TenantId;
use carflow_ratelimit::{FixedBudget, RateLimiterRegistry, SweeperHandle};
use carflow_tenancy::{ScopeManager, SessionBinder, TenantBudget, TenantDirectory};

use crate::config::{AppConfig, ConfigError};

/// Per-tenant limiter, budgets read from the tenant directory.
pub type TenantLimiter = RateLimiterRegistry<TenantId, TenantBudget<dyn TenantDirectory>>;

/// Anonymous limiter keyed by client address.
pub type ClientLimiter = RateLimiterRegistry<IpAddr, FixedBudget>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential issue / validate / refresh.
    pub validator: Arc<CredentialValidator>,
    /// Per-tenant rate limiter.
    pub tenant_limiter: Arc<TenantLimiter>,
    /// Client-address rate limiter for public routes.
    pub client_limiter: Arc<ClientLimiter>,
    /// Isolation scope manager.
    pub scopes: ScopeManager,
    /// Tenant configuration provider.
    pub directory: Arc<dyn TenantDirectory>,
    /// Configuration the state was built from.
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tenant_limiter", &self.tenant_limiter)
            .field("client_limiter", &self.client_limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Credential`] if the validator rejects the
    /// configured secrets or lifetimes.
    pub fn new(
        config: AppConfig,
        directory: Arc<dyn TenantDirectory>,
        binder: Arc<dyn SessionBinder>,
    ) -> Result<Self, ConfigError> {
        let validator = CredentialValidator::new(config.credentials.clone())?;
        let limits = &config.rate_limit;

        let tenant_limiter = RateLimiterRegistry::new("tenant", TenantBudget::new(Arc::clone(&directory)))
            .with_retry_after(limits.retry_after)
            .with_eviction(limits.eviction);
        let client_limiter = RateLimiterRegistry::new("ip", FixedBudget(limits.client_per_minute))
            .with_retry_after(limits.retry_after)
            .with_eviction(limits.eviction);

        Ok(Self {
            validator: Arc::new(validator),
            tenant_limiter: Arc::new(tenant_limiter),
            client_limiter: Arc::new(client_limiter),
            scopes: ScopeManager::new(binder),
            directory,
            config: Arc::new(config),
        })
    }

    /// Start the eviction sweepers for both limiters on the current runtime.
    pub fn spawn_sweepers(&self) -> Sweepers {
        let interval = self.config.rate_limit.sweep_interval;
        Sweepers {
            tenant: self.tenant_limiter.spawn_sweeper(interval),
            client: self.client_limiter.spawn_sweeper(interval),
        }
    }
}

/// Running sweeper tasks. Dropping this stops them.
#[derive(Debug)]
pub struct Sweepers {
    tenant: SweeperHandle,
    client: SweeperHandle,
}

impl Sweepers {
    /// Stop both sweepers and wait for them to exit.
    pub async fn shutdown(self) {
        self.tenant.shutdown().await;
        self.client.shutdown().await;
    }
}
