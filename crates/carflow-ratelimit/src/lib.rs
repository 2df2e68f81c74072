#![deny(missing_docs)]

//! # carflow-ratelimit: Adaptive Token-Bucket Registry
//!
//! One generic limiter, parameterized by key type and budget source, backs
//! both the per-tenant limiter (`K = TenantId`) and the anonymous
//! client-address limiter (`K = IpAddr`).
//!
//! ## Budget to Bucket
//!
//! A budget is expressed in requests per minute:
//!
//! ```text
//! rate     = budget / 60          tokens per second
//! capacity = max(1, ceil(rate))   burst size
//! ```
//!
//! A budget of zero is a configuration error, never "unlimited".
//!
//! ## Concurrency
//!
//! The key map sits behind a `parking_lot::RwLock`; each bucket behind its
//! own `Mutex`. Budget lookups are async and run with no lock held. The
//! write lock is taken only for the double-checked insert, so exactly one
//! bucket is created per key between two evictions.

pub mod bucket;
pub mod budget;
pub mod error;
pub mod policy;
pub mod registry;
pub mod sweeper;

pub use bucket::TokenBucket;
pub use budget::{BudgetSource, FixedBudget};
pub use error::RateLimitError;
pub use policy::{EvictionPolicy, RetryAfterPolicy};
pub use registry::{Decision, RateLimiterRegistry};
pub use sweeper::SweeperHandle;
