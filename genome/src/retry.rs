//! Bounded exponential backoff for fallible async operations.
//!
//! One executor serves every retried call site in the workspace: remote
//! sequence generation, ledger submission and trade operations. Only
//! errors classified transient are retried.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Classification of an error as worth retrying.
pub trait Transient {
    /// Whether a retry of the failed operation may succeed.
    fn is_transient(&self) -> bool;
}

/// Retry bounds for one operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// The last error of a failed operation, annotated with the attempt count.
#[derive(Debug, thiserror::Error)]
#[error("{last} (gave up after {attempts} attempt(s))")]
pub struct RetryExhausted<E: std::error::Error> {
    /// Error from the final attempt
    pub last: E,
    /// Total attempts made, the first one included
    pub attempts: u32,
}

/// Executes an async operation with bounded exponential backoff.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create an executor with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds, fails non-transiently, or retries are
    /// exhausted. The delay before retry `k` is `base_delay * 2^(k-1)`.
    pub async fn execute<T, E, F, Fut>(
        &self,
        label: &str,
        mut op: F,
    ) -> std::result::Result<T, RetryExhausted<E>>
    where
        E: std::error::Error + Transient,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempts <= self.policy.max_retries => {
                    let delay = self.policy.base_delay * 2u32.pow(attempts - 1);
                    warn!(
                        operation = %label,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(RetryExhausted {
                    last: err,
                    attempts,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("transient")]
        Transient,
        #[error("fatal")]
        Fatal,
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::new(RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        });

        let result = executor
            .execute("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_after_four_attempts_with_doubling_delays() {
        let calls = AtomicU32::new(0);
        let base = Duration::from_millis(100);
        let executor = RetryExecutor::new(RetryPolicy {
            max_retries: 3,
            base_delay: base,
        });

        let started = tokio::time::Instant::now();
        let err = executor
            .execute("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TestError::Transient) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Delays 100 + 200 + 400: ratio 1:2:4
        assert_eq!(started.elapsed(), base * 7);
        assert!(err.to_string().contains("4 attempt"));
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::default();

        let err = executor
            .execute("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TestError::Fatal) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
