//! # Identity Newtypes
//!
//! String-based identifiers for tenants and users. Identifiers arrive from
//! signed credentials and tenant configuration, so both types validate
//! their format at construction and on deserialization.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_ID_LEN: usize = 128;

fn valid_id(s: &str, extra: &[char]) -> bool {
    !s.is_empty()
        && s.len() <= MAX_ID_LEN
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') || extra.contains(&c))
}

/// Identifier of a tenant (one customer organisation of the SaaS).
///
/// Used as the rate-limit key and as the isolation binding for the
/// storage layer, so it must never be empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant identifier, validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTenantId`] for empty, overlong, or
    /// non `[A-Za-z0-9._-]` input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if valid_id(&s, &[]) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidTenantId(s))
        }
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TenantId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// Identifier of a user within the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier, validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUserId`] for empty, overlong, or
    /// malformed input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if valid_id(&s, &['@']) {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidUserId(s))
        }
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}
