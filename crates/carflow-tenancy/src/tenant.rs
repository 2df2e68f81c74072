//! Tenant records.

use carflow_core::{Plan, ResourceLimits, TenantId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Normal operation.
    Active,
    /// Deactivated by the tenant.
    Inactive,
    /// Suspended by an operator.
    Suspended,
}

impl TenantStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

/// A configured tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant identifier.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// Subscription plan.
    pub plan: Plan,
    /// Resource limits; initially the plan defaults.
    pub limits: ResourceLimits,
    /// Lifecycle status.
    pub status: TenantStatus,
}

impl Tenant {
    /// An active tenant on `plan` with the plan's default limits.
    pub fn new(id: TenantId, name: impl Into<String>, plan: Plan) -> Self {
        Self {
            id,
            name: name.into(),
            plan,
            limits: plan.default_limits(),
            status: TenantStatus::Active,
        }
    }

    /// Override the API budget in requests per minute.
    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.limits.api_rate_limit = per_minute;
        self
    }

    /// Requests-per-minute budget for the tenant rate limiter.
    pub fn api_rate_limit(&self) -> u32 {
        self.limits.api_rate_limit
    }
}
