//! Directory and isolation errors.

use carflow_core::TenantId;
use thiserror::Error;
use uuid::Uuid;

/// Tenant configuration lookup failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No tenant with this id is configured.
    #[error("unknown tenant: {0}")]
    UnknownTenant(TenantId),

    /// The backing store could not be reached.
    #[error("tenant directory unavailable: {0}")]
    Unavailable(String),
}

/// Opening or closing an isolation scope failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IsolationError {
    /// The storage session refused the tenant binding.
    #[error("failed to bind tenant {tenant}: {reason}")]
    Bind {
        /// Tenant being bound.
        tenant: TenantId,
        /// Binder-reported cause.
        reason: String,
    },

    /// The session already carries a tenant binding.
    #[error("session {scope} is still bound to tenant {bound}")]
    SessionBusy {
        /// Scope whose session is occupied.
        scope: Uuid,
        /// Tenant currently bound.
        bound: TenantId,
    },

    /// Unbind was called for a session with no binding.
    #[error("session {scope} has no tenant binding")]
    NotBound {
        /// Scope being released.
        scope: Uuid,
    },

    /// The storage session refused the reset.
    #[error("failed to unbind scope {scope}: {reason}")]
    Unbind {
        /// Scope being released.
        scope: Uuid,
        /// Binder-reported cause.
        reason: String,
    },
}
