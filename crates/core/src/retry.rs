//! Delay policies for the poll loop
//!
//! The poll loop never gives up; a policy only decides how long to wait
//! before the next listing attempt after `attempt` consecutive failed or
//! empty cycles.

use std::fmt::Debug;
use std::time::Duration;

use agentmetrics_domain::constants::DEFAULT_POLL_INTERVAL_SECS;
use rand::Rng;

/// Cap on the backoff exponent so the multiplier cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Wait-time policy for unbounded retries.
pub trait RetryPolicy: Send + Sync + Debug {
    /// Delay before the next attempt. `attempt` starts at 1 for the first
    /// retry.
    fn delay_for(&self, attempt: u32) -> Duration;
}

/// Same delay every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }
}

impl RetryPolicy for FixedInterval {
    fn delay_for(&self, _attempt: u32) -> Duration {
        self.interval
    }
}

/// Exponential backoff capped at `max_delay`, with symmetric jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl ExponentialBackoff {
    /// Delay doubles from `base_delay` and is capped at `max_delay`.
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self { base_delay, max_delay: max_delay.max(base_delay), jitter_factor: 0.0 }
    }

    /// Jitter factor clamped to `0.0..=1.0`; `0.3` spreads each delay over
    /// ±15% of its nominal value.
    #[must_use]
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    fn nominal_delay(&self, attempt: u32) -> Duration {
        let base_millis = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_millis = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);

        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        let delay_millis = base_millis.saturating_mul(2_u64.saturating_pow(exponent));

        Duration::from_millis(delay_millis.min(max_millis))
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor == 0.0 {
            return delay;
        }

        let delay_millis = delay.as_millis() as f64;
        let jitter_range = delay_millis * self.jitter_factor;
        let jitter = rand::thread_rng().gen_range(-jitter_range / 2.0..=jitter_range / 2.0);

        Duration::from_millis((delay_millis + jitter).max(0.0) as u64)
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.apply_jitter(self.nominal_delay(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_interval_ignores_attempt() {
        let policy = FixedInterval::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(1_000), Duration::from_secs(10));
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn jitter_stays_within_band() {
        let policy = ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(10))
            .with_jitter_factor(0.2);

        for _ in 0..200 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(9), "{delay:?}");
            assert!(delay <= Duration::from_secs(11), "{delay:?}");
        }
    }

    #[test]
    fn jitter_factor_is_clamped() {
        let policy = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(1))
            .with_jitter_factor(5.0);
        assert_eq!(policy.jitter_factor, 1.0);
    }
}
