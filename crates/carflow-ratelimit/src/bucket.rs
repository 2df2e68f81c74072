//! # Token Bucket
//!
//! Continuous-refill bucket. All methods take the current monotonic
//! instant explicitly so refill math is deterministic under test.
//!
//! Invariant: `0 <= tokens <= capacity` after every operation. Refill is a
//! pure function of elapsed time since the last refill; an instant earlier
//! than the last refill adds nothing and does not move the refill mark.

use std::time::Instant;

use crate::error::RateLimitError;

/// Per-key limiter state.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    rate: f64,
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    /// A full bucket with the given burst `capacity` and refill `rate`
    /// (tokens per second).
    ///
    /// Non-finite or non-positive inputs are clamped: capacity to at least
    /// one token, rate to a tiny positive value.
    pub fn new(capacity: f64, rate: f64, now: Instant) -> Self {
        let capacity = if capacity.is_finite() { capacity.max(1.0) } else { 1.0 };
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { f64::MIN_POSITIVE };
        Self {
            capacity,
            rate,
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    /// Bucket for a requests-per-minute budget.
    ///
    /// `key` only labels the error.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::ZeroBudget`] for a zero budget.
    pub fn from_budget(
        key: &dyn std::fmt::Display,
        per_minute: u32,
        now: Instant,
    ) -> Result<Self, RateLimitError> {
        if per_minute == 0 {
            return Err(RateLimitError::ZeroBudget {
                key: key.to_string(),
            });
        }
        let rate = f64::from(per_minute) / 60.0;
        Ok(Self::new(rate.ceil(), rate, now))
    }

    /// Add tokens for the time elapsed since the last refill.
    pub fn refill(&mut self, now: Instant) {
        if now <= self.last_refill {
            return;
        }
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Refill, then take one token if a whole one is available.
    ///
    /// Always records `now` as the last time the key was seen.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if now > self.last_seen {
            self.last_seen = now;
        }
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current token count (as of the last refill).
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Burst size.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Refill rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Last acquisition attempt.
    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }
}
