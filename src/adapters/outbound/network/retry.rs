use std::future::Future;
use std::time::Duration;

/// Retry settings with linear backoff: attempt `n` is followed by a wait of
/// `base_delay * n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(10))
    }
}

/// Failure classification used by `retry_with_backoff`
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Last failure of a retried operation and how many attempts were made
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub error: E,
    pub attempts: u32,
}

/// Runs `operation` until it succeeds, fails fatally, or attempts run out
///
/// `on_retry` is called before each wait with the attempt number, the
/// failure and the delay about to be slept.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    mut on_retry: R,
) -> std::result::Result<T, RetryExhausted<E>>
where
    E: Retryable,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    R: FnMut(u32, &E, Duration),
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_retryable() || attempt >= policy.max_attempts => {
                return Err(RetryExhausted {
                    error,
                    attempts: attempt,
                });
            }
            Err(error) => {
                let delay = policy.delay_after(attempt);
                on_retry(attempt, &error, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
