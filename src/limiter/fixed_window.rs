//! In-process fixed-window counters.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{MAX_WINDOW, RateDecision, RateLimiter};

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window limiter keyed by `client|action`.
///
/// A counter is created on first use and replaced (not merged) once its
/// window has ended. When a request would push the count past the limit it
/// is denied and the count stays pinned at the limit. Memory is O(1) per
/// active key; [`purge_expired`](Self::purge_expired) drops finished windows.
#[derive(Debug, Default)]
pub struct FixedWindowLimiter {
    counters: Mutex<HashMap<String, Counter>>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and count one request.
    ///
    /// Windows longer than [`MAX_WINDOW`] are clamped to it.
    pub fn check(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        let now = Instant::now();
        let window = window.min(MAX_WINDOW);

        if limit == 0 {
            return RateDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_after: window,
            };
        }

        let mut counters = self.lock();
        let fresh = Counter {
            count: 0,
            reset_at: now + window,
        };
        let counter = counters.entry(key.to_string()).or_insert(fresh);
        if now > counter.reset_at {
            *counter = fresh;
        }

        let reset_after = counter.reset_at.saturating_duration_since(now);
        if counter.count >= limit {
            counter.count = limit;
            return RateDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_after,
            };
        }

        counter.count += 1;
        RateDecision {
            allowed: true,
            limit,
            remaining: limit - counter.count,
            reset_after,
        }
    }

    /// Drop counters whose window has ended. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut counters = self.lock();
        let before = counters.len();
        counters.retain(|_, c| now <= c.reset_at);
        before - counters.len()
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Counter>> {
        // Counters stay consistent even if a holder panicked mid-update.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn allow(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        self.check(key, limit, window)
    }
}
