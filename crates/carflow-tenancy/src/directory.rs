//! # Tenant Directory
//!
//! Read-only view of tenant configuration. The rate limiter only ever asks
//! for a tenant's API budget, and only when it provisions that tenant's
//! bucket.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use carflow_core::TenantId;
use carflow_ratelimit::{BudgetSource, RateLimitError};
use parking_lot::RwLock;

use crate::error::DirectoryError;
use crate::tenant::Tenant;

/// Tenant configuration provider.
#[async_trait]
pub trait TenantDirectory: Send + Sync + 'static {
    /// Look up a tenant.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::UnknownTenant`] when no such tenant is configured,
    /// [`DirectoryError::Unavailable`] when the store failed.
    async fn tenant(&self, id: &TenantId) -> Result<Tenant, DirectoryError>;
}

/// Directory held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTenantDirectory {
    tenants: RwLock<HashMap<TenantId, Tenant>>,
}

impl InMemoryTenantDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with `tenants`.
    pub fn with_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let dir = Self::new();
        for t in tenants {
            dir.insert(t);
        }
        dir
    }

    /// Add or replace a tenant. Returns the previous record.
    ///
    /// A replaced budget takes effect when the tenant's bucket is next
    /// provisioned, i.e. after the next eviction.
    pub fn insert(&self, tenant: Tenant) -> Option<Tenant> {
        self.tenants.write().insert(tenant.id.clone(), tenant)
    }

    /// Remove a tenant.
    pub fn remove(&self, id: &TenantId) -> Option<Tenant> {
        self.tenants.write().remove(id)
    }

    /// Number of tenants.
    pub fn len(&self) -> usize {
        self.tenants.read().len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.tenants.read().is_empty()
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn tenant(&self, id: &TenantId) -> Result<Tenant, DirectoryError> {
        self.tenants
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::UnknownTenant(id.clone()))
    }
}

/// Rate-limit budgets read from a [`TenantDirectory`].
#[derive(Debug)]
pub struct TenantBudget<D: ?Sized> {
    directory: Arc<D>,
}

impl<D: ?Sized> Clone for TenantBudget<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D: TenantDirectory + ?Sized> TenantBudget<D> {
    /// Adapter over `directory`.
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D: TenantDirectory + ?Sized> BudgetSource<TenantId> for TenantBudget<D> {
    async fn budget_per_minute(&self, key: &TenantId) -> Result<u32, RateLimitError> {
        match self.directory.tenant(key).await {
            Ok(tenant) => Ok(tenant.api_rate_limit()),
            Err(err) => {
                tracing::warn!(tenant_id = %key, error = %err, "no rate-limit budget for tenant");
                Err(RateLimitError::Budget {
                    key: key.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }
}
