//! Linear-backoff retry schedule for artifact deletion.
//!
//! A deletion is attempted at most [`RetryPolicy::max_attempts`] times.
//! After a failed attempt `n` (0-based) the worker waits
//! `base_delay * (n + 1)` before trying again, so the default schedule is
//! 2 s then 4 s. No wait follows the final attempt.

use std::time::Duration;

/// Attempts per job with the default policy.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base unit of the linear backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Tunable parameters for the retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay multiplied by the attempt number to get each backoff.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait after the failed attempt `attempt` (0-based).
    ///
    /// Returns `None` when `attempt` was the last one allowed.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        Some(self.base_delay * (attempt + 1))
    }

    /// Whether an HTTP status is worth another attempt.
    ///
    /// Server-side errors are treated as transient. Everything else is a
    /// final answer: 204 and 404 are expected outcomes, and other 4xx
    /// responses will not change on retry.
    pub fn is_retryable_status(status: u16) -> bool {
        (500..=599).contains(&status)
    }
}
