//! Per-attempt timeout: a race between a future and a timer, with the
//! losing side cancelled (`§5` "per-node timeouts are handled via race
//! between the node future and a timer, with the losing side cancelled").

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// The future did not resolve within the allotted `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutError {
    /// The duration that elapsed before giving up.
    pub duration: Duration,
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out after {:?}", self.duration)
    }
}

impl std::error::Error for TimeoutError {}

/// Race `future` against a `duration` timer. The future is dropped (and any
/// non-`'static` work it owns cancelled) if the timer wins.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { duration })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_future_resolves() {
        let result = with_timeout(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn slow_future_times_out() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            42
        })
        .await;
        assert!(result.is_err());
    }
}
