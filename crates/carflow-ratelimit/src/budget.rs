//! Budget sources.
//!
//! A [`BudgetSource`] answers "how many requests per minute may this key
//! make". It is consulted once per bucket creation, never per request.

use async_trait::async_trait;

use crate::error::RateLimitError;

/// Supplies the requests-per-minute budget for a key.
#[async_trait]
pub trait BudgetSource<K>: Send + Sync + 'static {
    /// Budget for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::Budget`] when the key has no budget
    /// (e.g. an unknown tenant) or the backing store failed.
    async fn budget_per_minute(&self, key: &K) -> Result<u32, RateLimitError>;
}

/// The same budget for every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBudget(pub u32);

#[async_trait]
impl<K: Sync> BudgetSource<K> for FixedBudget {
    async fn budget_per_minute(&self, _key: &K) -> Result<u32, RateLimitError> {
        Ok(self.0)
    }
}
