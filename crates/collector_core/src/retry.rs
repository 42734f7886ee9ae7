use std::time::Duration;

/// Bounded retry with linear backoff.
///
/// The acquisition scripts this component replaces retried forever with a
/// fixed sleep. Here the bound is explicit and required, so a dead source
/// fails the run instead of hanging it. No jitter: effective concurrency
/// against any one source is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per page, including the first. Values below 1 are
    /// treated as 1.
    pub max_attempts: u32,
    /// Delay before the first retry; grows linearly with the attempt number.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-based): linear in
    /// the attempt number, so 1x, 2x, 3x the base delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.max(1))
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }
}
