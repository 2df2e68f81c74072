//! Retry-hint and eviction policies.

use std::time::Duration;

/// Default `Retry-After` value, in seconds.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// How the retry hint on a denial is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfterPolicy {
    /// Always the same number of seconds.
    Fixed(u64),
    /// Time until the bucket holds one whole token, rounded up to a whole
    /// second, minimum 1.
    Precise,
}

impl Default for RetryAfterPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_RETRY_AFTER_SECS)
    }
}

impl RetryAfterPolicy {
    /// Retry hint for a bucket currently holding `tokens` and refilling at
    /// `rate` tokens per second.
    pub fn retry_after(self, tokens: f64, rate: f64) -> u64 {
        match self {
            Self::Fixed(secs) => secs,
            Self::Precise => {
                let deficit = (1.0 - tokens).max(0.0);
                // Tolerate float noise around whole seconds.
                let secs = (deficit / rate - 1e-9).ceil();
                if secs.is_finite() && secs >= 1.0 {
                    secs as u64
                } else {
                    1
                }
            }
        }
    }
}

/// Which buckets a sweep removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Drop every bucket on each sweep.
    ResetAll,
    /// Drop buckets whose last acquisition is older than the given age.
    IdleFor(Duration),
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::IdleFor(Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ignores_bucket_state() {
        assert_eq!(RetryAfterPolicy::default().retry_after(0.0, 2.0), 60);
        assert_eq!(RetryAfterPolicy::Fixed(5).retry_after(0.9, 0.01), 5);
    }

    #[test]
    fn precise_rounds_up() {
        // 100/min: 0.6 tokens missing at 1/0.6 tok/s takes 0.36s.
        assert_eq!(RetryAfterPolicy::Precise.retry_after(0.4, 100.0 / 60.0), 1);
        // 1/min: a whole token takes 60s.
        assert_eq!(RetryAfterPolicy::Precise.retry_after(0.0, 1.0 / 60.0), 60);
        // Half a token at 1/60 tok/s is 30s.
        assert_eq!(RetryAfterPolicy::Precise.retry_after(0.5, 1.0 / 60.0), 30);
    }

    #[test]
    fn precise_is_at_least_one_second() {
        assert_eq!(RetryAfterPolicy::Precise.retry_after(0.999, 1000.0), 1);
        assert_eq!(RetryAfterPolicy::Precise.retry_after(1.0, 1.0), 1);
    }
}
