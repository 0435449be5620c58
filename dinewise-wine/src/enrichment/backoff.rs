//! Exponential backoff with jitter
//!
//! `delay(n) = min(base * 2^n, max) + jitter`, jitter drawn uniformly from
//! `[0, jitter_max)`.

use dinewise_common::config::EnrichmentConfig;
use rand::Rng;
use std::time::Duration;

/// Retry delay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
    jitter_max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration, jitter_max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter_max,
        }
    }

    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self::new(
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.backoff_max_ms),
            Duration::from_millis(config.jitter_max_ms),
        )
    }

    /// No waiting at all (tests, replays)
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_delay(&self) -> Duration {
        self.max
    }

    pub fn jitter_max(&self) -> Duration {
        self.jitter_max
    }

    /// Exponential part only, capped at `max`
    pub fn base_delay(&self, attempt: u32) -> Duration {
        // 2^31 already exceeds any sane cap; saturate instead of overflowing
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Delay with an explicit jitter value (clamped below `jitter_max`)
    pub fn delay_with_jitter(&self, attempt: u32, jitter: Duration) -> Duration {
        let jitter = if self.jitter_max.is_zero() {
            Duration::ZERO
        } else {
            jitter.min(self.jitter_max.saturating_sub(Duration::from_nanos(1)))
        };
        self.base_delay(attempt) + jitter
    }

    /// Delay before the retry following `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_max.is_zero() {
            Duration::ZERO
        } else {
            let nanos = self.jitter_max.as_nanos().min(u64::MAX as u128) as u64;
            Duration::from_nanos(rand::thread_rng().gen_range(0..nanos))
        };
        self.delay_with_jitter(attempt, jitter)
    }
}
