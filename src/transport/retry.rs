//! Exponential backoff with full jitter

use rand::Rng;
use std::time::Duration;

/// Retry policy for transient fetch failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Backoff ceiling for the first retry; doubles on each further retry
    pub base_delay: Duration,

    /// Upper bound for any single backoff
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits, for tests and local fixtures
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Upper bound of the backoff after failed attempt `attempt` (1-based)
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Full jitter: uniform in `[0, ceiling(attempt)]`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt).as_millis() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling))
    }
}

/// Uniform random delay in `[min, max]`; zero when the range is empty
pub fn politeness_delay(min: Duration, max: Duration) -> Duration {
    if max.is_zero() || max < min {
        return min;
    }
    let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        };

        assert_eq!(policy.ceiling(1), Duration::from_secs(1));
        assert_eq!(policy.ceiling(2), Duration::from_secs(2));
        assert_eq!(policy.ceiling(3), Duration::from_secs(4));
        assert_eq!(policy.ceiling(4), Duration::from_secs(5));
        assert_eq!(policy.ceiling(40), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_stays_within_ceiling() {
        let policy = RetryPolicy::default();
        for attempt in 1..=5 {
            for _ in 0..50 {
                assert!(policy.backoff(attempt) <= policy.ceiling(attempt));
            }
        }
    }

    #[test]
    fn test_immediate_policy_never_sleeps() {
        let policy = RetryPolicy::immediate(5);
        assert_eq!(policy.backoff(3), Duration::ZERO);
    }

    #[test]
    fn test_politeness_delay_range() {
        let min = Duration::from_millis(10);
        let max = Duration::from_millis(30);
        for _ in 0..50 {
            let d = politeness_delay(min, max);
            assert!(d >= min && d <= max);
        }
        assert_eq!(politeness_delay(Duration::ZERO, Duration::ZERO), Duration::ZERO);
    }
}
