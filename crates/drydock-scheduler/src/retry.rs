//! Bounded-retry execution with exponential backoff.

use drydock_core::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::debug;

/// Retry budget for one fallible operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after every retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }
}

/// Run `op` up to `policy.max_attempts` times.
///
/// The deadline bounds every attempt and every backoff wait: once it has
/// passed, the call returns [`Error::DeadlineExceeded`] immediately, with
/// no further attempts and no further waiting. The delay before the nth
/// retry is `initial_delay * 2^(n-1)`. Exhausting the budget yields one
/// aggregated error carrying the attempt count and the last underlying
/// error.
pub async fn execute<T, F, Fut>(policy: RetryPolicy, deadline: Instant, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.initial_delay;
    let mut last_error = String::new();

    for attempt in 1..=policy.max_attempts {
        if Instant::now() >= deadline {
            return Err(Error::DeadlineExceeded);
        }

        match timeout_at(deadline, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(Error::DeadlineExceeded)) => return Err(Error::DeadlineExceeded),
            Ok(Err(err)) => {
                debug!(attempt, error = %err, "attempt failed");
                last_error = err.to_string();
            }
            Err(_) => return Err(Error::DeadlineExceeded),
        }

        if attempt < policy.max_attempts {
            if timeout_at(deadline, sleep(delay)).await.is_err() {
                return Err(Error::DeadlineExceeded);
            }
            delay *= 2;
        }
    }

    Err(Error::RetriesExhausted {
        attempts: policy.max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_kth_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = execute(
            RetryPolicy::new(5, Duration::from_millis(100)),
            far_deadline(),
            move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(Error::SyncFailed("transient".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_aggregates_attempts_and_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = execute(
            RetryPolicy::new(4, Duration::from_millis(10)),
            far_deadline(),
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Error::BuildFailed("compile error".to_string()))
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result.unwrap_err() {
            Error::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("compile error"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let start = Instant::now();

        let result: Result<()> = execute(
            RetryPolicy::new(3, Duration::from_millis(100)),
            far_deadline(),
            || async { Err(Error::SyncFailed("transient".to_string())) },
        )
        .await;

        assert!(result.is_err());
        // Two waits: 100ms then 200ms.
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_backoff_wait() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let deadline = Instant::now() + Duration::from_millis(50);

        let result: Result<()> = execute(
            RetryPolicy::new(10, Duration::from_millis(100)),
            deadline,
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Error::SyncFailed("transient".to_string()))
                }
            },
        )
        .await;

        // First attempt fails fast, then the 100ms wait hits the 50ms deadline.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err(), Error::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_prevents_any_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let deadline = Instant::now();
        tokio::time::advance(Duration::from_millis(1)).await;

        let result: Result<()> = execute(
            RetryPolicy::new(3, Duration::from_millis(10)),
            deadline,
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(result.unwrap_err(), Error::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_is_cut_off_at_the_deadline() {
        let deadline = Instant::now() + Duration::from_millis(50);

        let result: Result<()> = execute(
            RetryPolicy::new(3, Duration::from_millis(10)),
            deadline,
            || async {
                sleep(Duration::from_secs(60)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), Error::DeadlineExceeded));
    }
}
