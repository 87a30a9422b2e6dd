//! Retry with exponential backoff (`§4.5`: "the runtime may retry up to
//! `maxRetries` (default 0) with exponential backoff between attempts").

use std::future::Future;
use std::time::Duration;

/// Governs how many attempts a retried operation gets and how long to wait
/// between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts allowed after the first failure. `0` (the
    /// node-data default per `§4.5`) means "run once, never retry".
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay, regardless of attempt count.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// No retries: a single attempt only.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Construct a policy with `max_retries` attempts beyond the first,
    /// using the default base/max delay.
    #[must_use]
    pub const fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::none()
        }
    }

    /// The backoff delay before retry attempt number `attempt` (0-indexed:
    /// the delay awaited before the *second* overall attempt is
    /// `delay_for_attempt(0)`). Doubles each attempt, capped at
    /// `max_delay`, with up to 20% jitter to avoid thundering-herd retries.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        let capped = exp.min(self.max_delay);
        let jitter_frac = fastrand::f64() * 0.2;
        capped.mul_f64(1.0 - jitter_frac)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// The result of [`retry`]: the final attempt's outcome, plus how many
/// attempts were made in total (1 means it succeeded or gave up on the
/// first try).
#[derive(Debug, Clone)]
pub struct RetryOutcome<T, E> {
    /// `Ok` if any attempt succeeded, `Err` of the last attempt's error
    /// otherwise.
    pub result: Result<T, E>,
    /// Total attempts made, including the first.
    pub attempts: u32,
}

impl<T, E> RetryOutcome<T, E> {
    /// Retries consumed beyond the first attempt — the `retry_count` a
    /// [`NodeExecution`](https://docs.rs/nebula-execution) record wants.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Call `op` until it succeeds or `policy.max_retries` extra attempts have
/// been exhausted, sleeping [`RetryPolicy::delay_for_attempt`] between
/// failures. `op` receives the zero-indexed attempt number it is about to
/// make.
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, mut op: F) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        let result = op(attempt).await;
        match result {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                };
            }
            Err(error) => {
                if attempt >= policy.max_retries {
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt + 1,
                    };
                }
                tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
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
    async fn succeeds_on_first_attempt_without_retrying() {
        let policy = RetryPolicy::with_max_retries(3);
        let outcome = retry(&policy, |_attempt| async { Ok::<_, &str>(42) }).await;
        assert_eq!(outcome.result, Ok(42));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.retry_count(), 0);
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let calls = AtomicU32::new(0);
        let outcome = retry(&policy, |_attempt| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(outcome.result, Ok(2));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.retry_count(), 2);
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_last_error() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let outcome = retry(&policy, |attempt| async move { Err::<(), _>(attempt) }).await;
        assert_eq!(outcome.result, Err(2));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.retry_count(), 2);
    }

    #[test]
    fn default_policy_never_retries() {
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        assert!(policy.delay_for_attempt(0) <= Duration::from_millis(100));
        assert!(policy.delay_for_attempt(10) <= Duration::from_millis(500));
    }
}
