//! # Rate Limiter Registry
//!
//! Concurrency-safe map from key to [`TokenBucket`], provisioned lazily
//! from a [`BudgetSource`] on the key's first request.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::bucket::TokenBucket;
use crate::budget::BudgetSource;
use crate::error::RateLimitError;
use crate::policy::{EvictionPolicy, RetryAfterPolicy};

/// Outcome of one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A token was taken.
    Allowed {
        /// Whole tokens left after this request.
        remaining: u32,
    },
    /// No whole token was available.
    Denied {
        /// Seconds the caller should wait before retrying.
        retry_after: u64,
    },
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

type Shared = Arc<Mutex<TokenBucket>>;

/// Keyed token-bucket limiter.
pub struct RateLimiterRegistry<K, B> {
    name: &'static str,
    buckets: RwLock<HashMap<K, Shared>>,
    budget: B,
    retry_after: RetryAfterPolicy,
    eviction: EvictionPolicy,
    created: AtomicU64,
}

impl<K, B> std::fmt::Debug for RateLimiterRegistry<K, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterRegistry")
            .field("name", &self.name)
            .field("buckets", &self.buckets.read().len())
            .field("retry_after", &self.retry_after)
            .field("eviction", &self.eviction)
            .finish_non_exhaustive()
    }
}

impl<K, B> RateLimiterRegistry<K, B>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    B: BudgetSource<K>,
{
    /// Empty registry. `name` labels logs and metrics (`"tenant"`, `"ip"`).
    pub fn new(name: &'static str, budget: B) -> Self {
        Self {
            name,
            buckets: RwLock::new(HashMap::new()),
            budget,
            retry_after: RetryAfterPolicy::default(),
            eviction: EvictionPolicy::default(),
            created: AtomicU64::new(0),
        }
    }

    /// Set the retry-hint policy.
    pub fn with_retry_after(mut self, policy: RetryAfterPolicy) -> Self {
        self.retry_after = policy;
        self
    }

    /// Set the eviction policy.
    pub fn with_eviction(mut self, policy: EvictionPolicy) -> Self {
        self.eviction = policy;
        self
    }

    /// Metric / log label.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Eviction policy in force.
    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Try to take one token for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`RateLimitError`] when the key's bucket cannot be
    /// provisioned. Nothing is inserted in that case, so the next request
    /// retries the lookup.
    pub async fn acquire(&self, key: &K) -> Result<Decision, RateLimitError> {
        self.acquire_at(key, Instant::now()).await
    }

    /// [`acquire`](Self::acquire) against an explicit instant.
    ///
    /// # Errors
    ///
    /// Same as [`acquire`](Self::acquire).
    pub async fn acquire_at(&self, key: &K, now: Instant) -> Result<Decision, RateLimitError> {
        let bucket = self.bucket_for(key, now).await?;
        Ok(self.decide(&bucket, now))
    }

    fn decide(&self, bucket: &Shared, now: Instant) -> Decision {
        let mut b = bucket.lock();
        if b.try_acquire_at(now) {
            Decision::Allowed {
                remaining: b.tokens().floor() as u32,
            }
        } else {
            Decision::Denied {
                retry_after: self.retry_after.retry_after(b.tokens(), b.rate()),
            }
        }
    }

    async fn bucket_for(&self, key: &K, now: Instant) -> Result<Shared, RateLimitError> {
        let existing = self.buckets.read().get(key).map(Arc::clone);
        if let Some(bucket) = existing {
            return Ok(bucket);
        }

        // No lock is held across the lookup.
        let per_minute = self.budget.budget_per_minute(key).await?;
        let fresh = TokenBucket::from_budget(key, per_minute, now)?;

        let mut map = self.buckets.write();
        match map.entry(key.clone()) {
            Entry::Occupied(e) => Ok(Arc::clone(e.get())),
            Entry::Vacant(e) => {
                self.created.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(
                    "carflow_ratelimit_buckets_created_total",
                    "limiter" => self.name
                )
                .increment(1);
                tracing::debug!(
                    limiter = self.name,
                    key = %key,
                    per_minute,
                    "rate-limit bucket provisioned"
                );
                Ok(Arc::clone(e.insert(Arc::new(Mutex::new(fresh)))))
            }
        }
    }

    /// One eviction pass. Returns the number of buckets removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// [`sweep`](Self::sweep) against an explicit instant.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut map = self.buckets.write();
        let before = map.len();
        match self.eviction {
            EvictionPolicy::ResetAll => map.clear(),
            EvictionPolicy::IdleFor(ttl) => {
                map.retain(|_, b| now.saturating_duration_since(b.lock().last_seen()) < ttl)
            }
        }
        let evicted = before - map.len();
        drop(map);

        if evicted > 0 {
            metrics::counter!("carflow_ratelimit_evicted_total", "limiter" => self.name)
                .increment(evicted as u64);
        }
        tracing::debug!(limiter = self.name, evicted, "rate-limit sweep");
        evicted
    }

    /// Number of live buckets.
    pub fn len(&self) -> usize {
        self.buckets.read().len()
    }

    /// Whether no bucket exists.
    pub fn is_empty(&self) -> bool {
        self.buckets.read().is_empty()
    }

    /// Whether `key` has a bucket.
    pub fn contains(&self, key: &K) -> bool {
        self.buckets.read().contains_key(key)
    }

    /// Token count of `key`'s bucket as of its last refill.
    pub fn tokens(&self, key: &K) -> Option<f64> {
        let bucket = self.buckets.read().get(key).map(Arc::clone)?;
        let tokens = bucket.lock().tokens();
        Some(tokens)
    }

    /// Total buckets ever created by this registry.
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}
