//! # Subscription Plans
//!
//! Plan catalogue and the per-plan resource limits a tenant is created
//! with. `api_rate_limit` (requests per minute) is the budget the tenant
//! rate limiter is provisioned from.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Subscription plan of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Entry plan.
    Basic,
    /// Professional plan.
    Pro,
    /// Enterprise plan.
    Enterprise,
}

impl Plan {
    /// Wire representation of the plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Default resource limits for the plan.
    pub fn default_limits(&self) -> ResourceLimits {
        match self {
            Self::Basic => ResourceLimits {
                max_users: Some(10),
                max_cars: Some(50),
                api_rate_limit: 100,
                storage_limit_mb: Some(1024),
                backup_retention_days: 7,
            },
            Self::Pro => ResourceLimits {
                max_users: Some(50),
                max_cars: Some(200),
                api_rate_limit: 500,
                storage_limit_mb: Some(5120),
                backup_retention_days: 30,
            },
            Self::Enterprise => ResourceLimits {
                max_users: None,
                max_cars: None,
                api_rate_limit: 1000,
                storage_limit_mb: None,
                backup_retention_days: 90,
            },
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(ValidationError::UnknownPlan(other.to_string())),
        }
    }
}

/// Resource limits attached to a tenant.
///
/// `None` means unlimited for the capacity-style limits. The API rate
/// limit is always finite: an unlimited rate budget is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of users.
    pub max_users: Option<u32>,
    /// Maximum number of cars in the fleet.
    pub max_cars: Option<u32>,
    /// API requests per minute.
    pub api_rate_limit: u32,
    /// Storage quota in megabytes.
    pub storage_limit_mb: Option<u32>,
    /// Days of backups kept.
    pub backup_retention_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_budgets_increase_with_tier() {
        let basic = Plan::Basic.default_limits().api_rate_limit;
        let pro = Plan::Pro.default_limits().api_rate_limit;
        let enterprise = Plan::Enterprise.default_limits().api_rate_limit;
        assert_eq!((basic, pro, enterprise), (100, 500, 1000));
    }

    #[test]
    fn enterprise_capacity_limits_are_unlimited() {
        let limits = Plan::Enterprise.default_limits();
        assert!(limits.max_users.is_none());
        assert!(limits.max_cars.is_none());
    }

    #[test]
    fn plan_parses_wire_names() {
        assert_eq!("pro".parse::<Plan>().unwrap(), Plan::Pro);
        assert!("gold".parse::<Plan>().is_err());
    }
}
