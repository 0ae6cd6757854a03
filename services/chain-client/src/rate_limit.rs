//! Sliding-window rate limiter shared by every `ChainClient` call
//!: "allow a request iff elapsed since last grant ≥
//! min-interval, and count within the current window ≤ quota."
//!
//! A single instance is shared (via `Arc`) across the pipeline, sweep,
//! and PSBT-builder threads, so admission and the last-grant update
//! happen under one mutex.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    min_interval: Duration,
    quota: usize,
    window: Duration,
    state: Mutex<State>,
}

struct State {
    last_grant: Option<Instant>,
    grants: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, quota: usize, window: Duration) -> Self {
        Self {
            min_interval,
            quota,
            window,
            state: Mutex::new(State {
                last_grant: None,
                grants: VecDeque::new(),
            }),
        }
    }

    /// Defaults matching an esplora-style public API: one request per
    /// 100ms, up to 60 requests per 10s window.
    pub fn default_public_api() -> Self {
        Self::new(Duration::from_millis(100), 60, Duration::from_secs(10))
    }

    /// Returns `Ok(())` if a request may proceed now (and records the
    /// grant), or `Err(wait)` with how long the caller should back off.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");

        if let Some(last) = state.last_grant {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                return Err(self.min_interval - elapsed);
            }
        }

        while let Some(&front) = state.grants.front() {
            if now.saturating_duration_since(front) > self.window {
                state.grants.pop_front();
            } else {
                break;
            }
        }

        if state.grants.len() >= self.quota {
            let oldest = *state.grants.front().expect("quota > 0 implies a front");
            return Err(self.window.saturating_sub(now.saturating_duration_since(oldest)));
        }

        state.grants.push_back(now);
        state.last_grant = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_within_min_interval_is_denied() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 100, Duration::from_secs(10));
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_err());
    }

    #[test]
    fn quota_denies_once_window_is_full() {
        let limiter = RateLimiter::new(Duration::from_millis(0), 2, Duration::from_secs(10));
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_err());
    }
}
