//! Bounded retry with exponential backoff.
//!
//! The policy is data, the retryability test is a closure and the operation
//! is a closure taking the 1-based attempt number, so any fallible async call
//! can be wrapped without a dedicated client type.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_retries(retries: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            base_delay,
        }
    }

    /// Delay to wait after `attempt` (1-based) failed: `base * 2^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up. The last error is returned unchanged.
pub async fn retry<T, E, F, Fut, R>(policy: &RetryPolicy, is_retryable: R, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts || !is_retryable(&e) => return Err(e),
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
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
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum Failure {
        Transient,
        Permanent,
    }

    impl Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn transient(e: &Failure) -> bool {
        *e == Failure::Transient
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::from_retries(2, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(200), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts_with_exponential_gaps() {
        let policy = RetryPolicy::from_retries(3, Duration::from_secs(1));
        let started = Arc::new(Mutex::new(Vec::new()));

        let calls = started.clone();
        let result: Result<(), Failure> = retry(&policy, transient, |_| {
            calls.lock().unwrap().push(Instant::now());
            async { Err(Failure::Transient) }
        })
        .await;

        assert_eq!(result, Err(Failure::Transient));
        let started = started.lock().unwrap();
        assert_eq!(started.len(), 4);

        let gaps: Vec<u64> = started
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect();
        assert_eq!(gaps, vec![1, 2, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let policy = RetryPolicy::from_retries(2, Duration::from_secs(1));
        let mut calls = 0;

        let result: Result<(), Failure> = retry(&policy, transient, |_| {
            calls += 1;
            async { Err(Failure::Permanent) }
        })
        .await;

        assert_eq!(result, Err(Failure::Permanent));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::from_retries(2, Duration::from_secs(1));

        let result = retry(&policy, transient, |attempt| async move {
            if attempt < 3 {
                Err(Failure::Transient)
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result, Ok(3));
    }
}
