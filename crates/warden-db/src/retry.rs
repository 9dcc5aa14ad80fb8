//! Retry with linear backoff
//!
//! Used by the [`ConnectionManager`](crate::ConnectionManager) to ride out a
//! store that is still coming up when the process starts.
//!
//! # Example
//!
//! ```ignore
//! use warden_db::{retry_with_backoff, RetryPolicy};
//!
//! let policy = RetryPolicy::new()
//!     .with_max_attempts(3)
//!     .with_base_delay(Duration::from_secs(2));
//!
//! let pool = retry_with_backoff(&policy, "connect", |_| open_pool()).await?;
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

/// Retry behavior for a fallible async operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with defaults (3 attempts, 2s step).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff step.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether another attempt is allowed after `attempt` failures.
    #[must_use]
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// The closure receives the 1-based attempt number. The last error is
/// returned when every attempt fails.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(err) if !policy.can_retry(attempt) => {
                error!(
                    operation = operation_name,
                    attempts = attempt,
                    error = %err,
                    "giving up after final attempt"
                );
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(6));
    }

    #[test]
    fn test_can_retry() {
        let policy = RetryPolicy::new().with_max_attempts(3);
        assert!(policy.can_retry(1));
        assert!(policy.can_retry(2));
        assert!(!policy.can_retry(3));

        // Zero still allows the initial attempt
        let policy = RetryPolicy::new().with_max_attempts(0);
        assert!(!policy.can_retry(1));
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff(&RetryPolicy::default(), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausted_waits_linearly() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = retry_with_backoff(&RetryPolicy::default(), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("unreachable".to_string()) }
        })
        .await;

        assert_eq!(result.unwrap_err(), "unreachable");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2s after the first failure, 4s after the second, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_on_later_attempt() {
        let result = retry_with_backoff(&RetryPolicy::default(), "test", |attempt| async move {
            if attempt < 2 {
                Err("not yet".to_string())
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }
}
