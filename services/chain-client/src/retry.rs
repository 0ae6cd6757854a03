//! Quadratic back-off retry for the height-with-retry primitive
//!: "retries with quadratic back-off up to K attempts (default
//! K=3, max wait 10s)."

use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const MAX_WAIT: Duration = Duration::from_secs(10);

/// `attempt` is 1-indexed; wait grows quadratically (`attempt^2 *
/// base`) and is clamped to `MAX_WAIT`.
pub fn backoff_for_attempt(attempt: u32, base: Duration) -> Duration {
    let scaled = base.saturating_mul(attempt.saturating_mul(attempt));
    std::cmp::min(scaled, MAX_WAIT)
}

/// Runs `op` up to `max_attempts` times, sleeping with quadratic
/// back-off between attempts. Returns the last error if every attempt
/// fails.
pub async fn with_retry<T, E, F, Fut>(max_attempts: u32, base: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                tokio::time::sleep(backoff_for_attempt(attempt, base)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_quadratically_and_clamps() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_for_attempt(1, base), Duration::from_millis(100));
        assert_eq!(backoff_for_attempt(2, base), Duration::from_millis(400));
        assert_eq!(backoff_for_attempt(3, base), Duration::from_millis(900));
        assert_eq!(backoff_for_attempt(100, base), MAX_WAIT);
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let mut calls = 0;
        let result: Result<u32, &str> = with_retry(3, Duration::from_millis(1), || {
            calls += 1;
            async move {
                if calls < 3 {
                    Err("transient")
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<u32, &str> = with_retry(3, Duration::from_millis(1), || {
            calls += 1;
            async move { Err("still failing") }
        })
        .await;
        assert_eq!(result, Err("still failing"));
        assert_eq!(calls, 3);
    }
}
