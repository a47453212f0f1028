//! Bounded retry with exponential backoff for gateway calls

use crate::error::{RagError, Result};
use std::future::Future;
use std::time::Duration;

/// Hard ceiling on attempts, whatever the configuration says
pub const MAX_ATTEMPTS_LIMIT: u32 = 5;

/// Per-call timeout plus a bounded number of attempts for transient errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        attempt_timeout: Duration,
    ) -> Result<Self> {
        if max_attempts == 0 || max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(RagError::Config(format!(
                "retry.max_attempts must be between 1 and {}",
                MAX_ATTEMPTS_LIMIT
            )));
        }
        if attempt_timeout.is_zero() {
            return Err(RagError::Config(
                "retry timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
            attempt_timeout,
        })
    }

    /// Single attempt, no backoff
    pub fn no_retry(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            attempt_timeout,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Each attempt is bounded by the attempt timeout; an elapsed timeout
    /// counts as a transient failure.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout(self.attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(RagError::Timeout(self.attempt_timeout)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(
                        "{} failed: {}. Retrying in {:?} (attempt {}/{})",
                        operation,
                        e,
                        backoff,
                        attempt + 1,
                        self.max_attempts
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.max_backoff);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::debug!("{} failed after {} attempt(s): {}", operation, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(4),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let value = policy
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(RagError::ServiceUnavailable("503".into()))
                } else {
                    Ok(n)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let err = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RagError::ServiceUnavailable("503".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::ServiceUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_fail_fast() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let err = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RagError::ExternalError("invalid input".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::ExternalError(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempts_time_out() {
        let policy = RetryPolicy::new(
            2,
            Duration::from_millis(10),
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .unwrap();
        let calls = AtomicU32::new(0);

        let err = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::Timeout(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalid_policies_rejected() {
        let d = Duration::from_secs(1);
        assert!(RetryPolicy::new(0, d, d, d).is_err());
        assert!(RetryPolicy::new(MAX_ATTEMPTS_LIMIT + 1, d, d, d).is_err());
        assert!(RetryPolicy::new(3, d, d, Duration::ZERO).is_err());
    }
}
