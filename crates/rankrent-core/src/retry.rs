//! Bounded retry policy with linearly growing, capped backoff.

use std::time::Duration;

/// Default number of status checks before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay between checks.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Default cap on the backoff multiplier.
pub const DEFAULT_MAX_MULTIPLIER: u32 = 3;

/// Retry policy for idempotent status checks.
///
/// The delay after attempt `n` (1-based) is `base_delay * min(n, max_multiplier)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay unit.
    pub base_delay: Duration,
    /// Largest multiple of `base_delay` ever waited.
    pub max_multiplier: u32,
}

impl RetryPolicy {
    /// Delay to wait after the given 1-based attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.clamp(1, self.max_multiplier.max(1))
    }

    /// Whether another attempt is allowed after `attempt` attempts.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..=5).map(|n| policy.delay_after(n).as_millis()).collect();
        assert_eq!(delays, vec![2000, 4000, 6000, 6000, 6000]);
    }

    #[test]
    fn attempts_are_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
    }
}
