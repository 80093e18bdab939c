//! Bounded retry with exponential backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Default number of attempts, first call included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff unit
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the last failure
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Failure of the final attempt
        last: E,
    },

    /// A failure classified as not retryable stopped the loop early
    Aborted(E),
}

/// Retry policy: attempt budget plus exponential backoff
///
/// After failed attempt `n` (0-based) the policy waits `base_delay * 2^n`
/// before the next attempt. There is no wait after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Attempt budget, first call included
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff unit
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait after failed attempt `attempt` (0-based)
    ///
    /// # Examples
    ///
    /// ```
    /// use polex_llm::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(3, Duration::from_secs(1));
    /// assert_eq!(policy.backoff(0), Duration::from_secs(1));
    /// assert_eq!(policy.backoff(1), Duration::from_secs(2));
    /// ```
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget runs out
    pub async fn retry<F, Fut, T, E, C>(
        &self,
        operation: &str,
        mut f: F,
        is_retryable: C,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        C: Fn(&E) -> bool,
    {
        let mut attempt = 0;

        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            operation = operation,
                            attempts = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(result);
                }
                Err(e) if !is_retryable(&e) => {
                    warn!(
                        operation = operation,
                        attempt = attempt + 1,
                        error = %e,
                        "Operation failed with a non-retryable error"
                    );
                    return Err(RetryError::Aborted(e));
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        warn!(
                            operation = operation,
                            attempts = attempt,
                            error = %e,
                            "Operation failed after max attempts"
                        );
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }

                    let backoff = self.backoff(attempt - 1);
                    warn!(
                        operation = operation,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Operation failed, retrying"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}
