//! Per-source request throttling
//!
//! A rolling-window limiter: at most `capacity` permits per window span.
//! Waiters queue on the tokio timer; a permit slot is consumed only when
//! `acquire` returns, so a waiter cancelled mid-wait never takes a slot.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::debug;

/// Rolling-window throttle, configured in requests per second.
///
/// A rate of `0.0` disables limiting entirely (every `acquire` returns
/// immediately) - the documented policy for sources with no configured
/// rate. Rates below one widen the window instead of rounding to zero:
/// `0.5` allows one request per two seconds.
#[derive(Debug)]
pub struct RateLimiter {
    window: Option<Mutex<Window>>,
}

#[derive(Debug)]
struct Window {
    capacity: usize,
    span: Duration,
    grants: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64) -> Self {
        if requests_per_second <= 0.0 {
            debug!("rate limiting disabled (rate {requests_per_second})");
            return Self::unlimited();
        }

        let (capacity, span) = if requests_per_second >= 1.0 {
            (requests_per_second.round() as usize, Duration::from_secs(1))
        } else {
            (1, Duration::from_secs_f64(1.0 / requests_per_second))
        };

        Self {
            window: Some(Mutex::new(Window {
                capacity,
                span,
                grants: VecDeque::with_capacity(capacity),
            })),
        }
    }

    /// A limiter that never throttles
    pub fn unlimited() -> Self {
        Self { window: None }
    }

    /// Suspend until a permit is free within the rolling window.
    ///
    /// Safe for any number of concurrent callers. The permit is recorded
    /// on the return path only; dropping the future while it waits
    /// releases nothing and consumes nothing.
    pub async fn acquire(&self) {
        let Some(window) = &self.window else { return };

        loop {
            let wakeup = {
                let mut w = window.lock();
                let now = Instant::now();
                while let Some(front) = w.grants.front() {
                    if now.duration_since(*front) >= w.span {
                        w.grants.pop_front();
                    } else {
                        break;
                    }
                }
                if w.grants.len() < w.capacity {
                    w.grants.push_back(now);
                    return;
                }
                match w.grants.front() {
                    Some(oldest) => *oldest + w.span,
                    None => now,
                }
            };
            sleep_until(wakeup).await;
        }
    }
}

/// Shared registry handing out one limiter per source
#[derive(Debug, Default)]
pub struct LimiterRegistry {
    limiters: DashMap<String, Arc<RateLimiter>>,
}

impl LimiterRegistry {
    /// Limiter for `source`, created at `requests_per_second` on first use
    pub fn for_source(&self, source: &str, requests_per_second: f64) -> Arc<RateLimiter> {
        self.limiters
            .entry(source.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::new(requests_per_second)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn grant_stamps(limiter: Arc<RateLimiter>, waiters: usize) -> Vec<Instant> {
        let handles: Vec<_> = (0..waiters)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut stamps = Vec::with_capacity(waiters);
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();
        stamps
    }

    #[tokio::test(start_paused = true)]
    async fn never_more_than_capacity_per_window() {
        let limiter = Arc::new(RateLimiter::new(2.0));
        let stamps = grant_stamps(limiter, 10).await;

        // In every run of three consecutive grants, the third must fall at
        // least one window after the first.
        for triple in stamps.windows(3) {
            assert!(triple[2] - triple[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_rate_never_throttles() {
        let start = Instant::now();
        let limiter = Arc::new(RateLimiter::new(0.0));
        let stamps = grant_stamps(limiter, 10).await;
        assert!(stamps.iter().all(|s| *s == start));
    }

    #[tokio::test(start_paused = true)]
    async fn fractional_rate_widens_the_window() {
        let start = Instant::now();
        let limiter = Arc::new(RateLimiter::new(0.5));
        let stamps = grant_stamps(limiter, 3).await;

        assert_eq!(stamps[0], start);
        assert!(stamps[1] - stamps[0] >= Duration::from_secs(2));
        assert!(stamps[2] - stamps[1] >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_waiter_does_not_consume_a_permit() {
        let limiter = Arc::new(RateLimiter::new(1.0));
        limiter.acquire().await;

        // This waiter is dropped while suspended on the full window.
        let cancelled = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::task::yield_now().await;
        cancelled.abort();
        let _ = cancelled.await;

        // The next grant still arrives as soon as the window frees up,
        // exactly one span after the first grant.
        let before = Instant::now();
        limiter.acquire().await;
        assert!(Instant::now() - before <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn registry_reuses_limiters_per_source() {
        let registry = LimiterRegistry::default();
        let a = registry.for_source("google_places", 2.0);
        let b = registry.for_source("google_places", 9.0);
        assert!(Arc::ptr_eq(&a, &b));

        let other = registry.for_source("serpapi", 2.0);
        assert!(!Arc::ptr_eq(&a, &other));
    }
}
