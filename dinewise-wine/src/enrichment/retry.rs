//! Bounded retry with exponential backoff
//!
//! The operation classifies each attempt itself: success, retryable failure,
//! or abort. Backoff math stays in [`BackoffPolicy`]; this module only drives
//! the loop and the sleeps.

use std::fmt::Display;
use std::future::Future;

use super::backoff::BackoffPolicy;

/// Classification of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome<T, E> {
    Success(T),
    /// Worth another attempt if any remain
    Retry(E),
    /// Stop immediately without further attempts
    Abort(E),
}

/// Why `with_retry` gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation aborted on attempt `attempt` (0-based)
    Aborted { attempt: u32, error: E },
    /// Every attempt failed; `last_error` is the final failure
    Exhausted { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
    /// Number of attempts actually started
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Aborted { attempt, .. } => *attempt + 1,
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_error(self) -> E {
        match self {
            RetryError::Aborted { error, .. } => error,
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }
}

/// Run `operation` up to `max_attempts` times
///
/// **Algorithm:**
/// 1. Call `operation(attempt)` with a 0-based attempt index
/// 2. `Success` returns immediately, `Abort` stops without sleeping
/// 3. `Retry` sleeps `policy.delay(attempt)` if attempts remain, otherwise
///    returns `Exhausted` with the last error
///
/// A `max_attempts` of zero is treated as one.
pub async fn with_retry<F, Fut, T, E>(
    operation_name: &str,
    policy: &BackoffPolicy,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            tracing::debug!(operation = operation_name, attempt, "Retrying operation");
        }

        match operation(attempt).await {
            AttemptOutcome::Success(value) => {
                if attempt > 0 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            AttemptOutcome::Abort(error) => {
                tracing::debug!(
                    operation = operation_name,
                    attempt,
                    error = %error,
                    "Operation aborted"
                );
                return Err(RetryError::Aborted { attempt, error });
            }
            AttemptOutcome::Retry(error) => {
                if attempt + 1 >= max_attempts {
                    tracing::warn!(
                        operation = operation_name,
                        attempts = max_attempts,
                        error = %error,
                        "Operation failed: max attempts exceeded"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: max_attempts,
                        last_error: error,
                    });
                }

                let delay = policy.delay(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    remaining = max_attempts - attempt - 1,
                    error = %error,
                    "Attempt failed, will retry after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = with_retry("test_op", &BackoffPolicy::immediate(), 3, |_| async {
            AttemptOutcome::<i32, String>::Success(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test_op", &BackoffPolicy::immediate(), 3, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    AttemptOutcome::Retry(format!("transient {}", attempt))
                } else {
                    AttemptOutcome::Success(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_reports_last_error() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test_op", &BackoffPolicy::immediate(), 3, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { AttemptOutcome::<(), String>::Retry(format!("fail {}", attempt)) }
        })
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, last_error }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "fail 2");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_abort_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test_op", &BackoffPolicy::immediate(), 5, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 1 {
                    AttemptOutcome::<(), String>::Abort("stop".to_string())
                } else {
                    AttemptOutcome::Retry("again".to_string())
                }
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts(), 2);
        assert_eq!(err.into_error(), "stop");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_max_attempts_runs_once() {
        let calls = AtomicU32::new(0);
        let _ = with_retry("test_op", &BackoffPolicy::immediate(), 0, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { AttemptOutcome::<(), String>::Retry("x".to_string()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
