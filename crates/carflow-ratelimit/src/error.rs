//! Rate limiter errors.
//!
//! Every variant is a deployment or collaborator problem. A denied request
//! is not an error; it is [`Decision::Denied`](crate::Decision::Denied).

use thiserror::Error;

/// Failure to provision a bucket.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The budget source could not produce a budget for the key.
    #[error("no rate-limit budget for {key}: {reason}")]
    Budget {
        /// Display form of the key.
        key: String,
        /// Why the source failed.
        reason: String,
    },

    /// The budget source returned zero requests per minute.
    #[error("rate-limit budget for {key} is zero")]
    ZeroBudget {
        /// Display form of the key.
        key: String,
    },
}
