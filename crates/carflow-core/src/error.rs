//! # Validation Errors
//!
//! Errors raised when a domain primitive is constructed from untrusted
//! input. Each variant carries the rejected value so operators can see
//! what was sent.

use thiserror::Error;

/// Validation errors for identifier newtypes and enum parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Tenant identifier is empty, too long, or contains illegal characters.
    #[error("invalid tenant id: \"{0}\" (expected 1-128 characters of [A-Za-z0-9._-])")]
    InvalidTenantId(String),

    /// User identifier is empty, too long, or contains illegal characters.
    #[error("invalid user id: \"{0}\" (expected 1-128 characters of [A-Za-z0-9._@-])")]
    InvalidUserId(String),

    /// Unknown role name.
    #[error("unknown role: \"{0}\" (expected admin or user)")]
    UnknownRole(String),

    /// Unknown credential kind tag.
    #[error("unknown credential kind: \"{0}\" (expected access or refresh)")]
    UnknownCredentialKind(String),

    /// Unknown subscription plan.
    #[error("unknown plan: \"{0}\" (expected basic, pro or enterprise)")]
    UnknownPlan(String),
}
