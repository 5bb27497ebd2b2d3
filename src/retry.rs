//! Retry policy for requests to the chat backend.
//!
//! The controller never retries on its own; retries, when configured, happen
//! inside the HTTP client and are invisible to the conversation state.

use std::time::Duration;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Default upper bound on any single retry delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Exponential backoff with a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub initial_backoff: Duration,
    /// Cap on a single delay, including server-suggested delays.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    /// Sets the number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial and maximum backoff.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// Returns true if another attempt is allowed after `attempt` retries.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before retry number `attempt` (zero-based).
    ///
    /// A server-provided `retry_after` (seconds) takes precedence over the
    /// exponential schedule. Both are capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let delay = match retry_after {
            Some(secs) => Duration::from_secs(secs),
            None => {
                let factor = 2u32.saturating_pow(attempt.min(16));
                self.initial_backoff.saturating_mul(factor)
            }
        };
        delay.min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_never_retries() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn retries_up_to_limit() {
        let policy = RetryPolicy::none().with_max_retries(2);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::none()
            .with_max_retries(10)
            .with_backoff(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(policy.backoff(0, None), Duration::from_millis(100));
        assert_eq!(policy.backoff(1, None), Duration::from_millis(200));
        assert_eq!(policy.backoff(2, None), Duration::from_millis(400));
        assert_eq!(policy.backoff(3, None), Duration::from_millis(500));
        assert_eq!(policy.backoff(40, None), Duration::from_millis(500));
    }

    #[test]
    fn retry_after_takes_precedence() {
        let policy = RetryPolicy::none().with_backoff(Duration::from_millis(100), Duration::from_secs(5));
        assert_eq!(policy.backoff(0, Some(2)), Duration::from_secs(2));
        assert_eq!(policy.backoff(0, Some(60)), Duration::from_secs(5));
    }

    #[test]
    fn max_backoff_not_below_initial() {
        let policy = RetryPolicy::none().with_backoff(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(policy.max_backoff, Duration::from_secs(2));
    }
}
