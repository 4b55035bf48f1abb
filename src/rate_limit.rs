use std::time::Duration;

use log::{debug, info};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::RateLimit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCategory {
    Summary,
    Translation,
}

impl RateCategory {
    fn index(self) -> usize {
        match self {
            Self::Summary => 0,
            Self::Translation => 1,
        }
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    started: Instant,
}

impl Window {
    fn fresh() -> Self {
        Self {
            count: 0,
            started: Instant::now(),
        }
    }
}

/// Fixed-window limiter for the summary and translation endpoints.
///
/// Both categories sit behind one lock, and the lock is held while a caller
/// sleeps out a full window, so waiting callers are served in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    limits: [RateLimit; 2],
    windows: Mutex<[Window; 2]>,
}

impl RateLimiter {
    pub fn new(summary: RateLimit, translation: RateLimit) -> Self {
        Self {
            limits: [summary, translation],
            windows: Mutex::new([Window::fresh(), Window::fresh()]),
        }
    }

    pub fn limit(&self, category: RateCategory) -> RateLimit {
        self.limits[category.index()]
    }

    pub async fn acquire(&self, category: RateCategory) {
        let limit = self.limit(category);
        let mut windows = self.windows.lock().await;
        let window = &mut windows[category.index()];

        let elapsed = window.started.elapsed();
        if elapsed >= limit.window {
            *window = Window::fresh();
        } else if window.count >= limit.limit {
            let wait = limit.window.saturating_sub(elapsed);
            if wait > Duration::ZERO {
                info!(
                    "{category:?} rate limit reached ({} per {:?}), waiting {wait:?}",
                    limit.limit, limit.window
                );
                tokio::time::sleep(wait).await;
            }
            *window = Window::fresh();
        }

        window.count += 1;
        debug!(
            "{category:?} request {}/{} in current window",
            window.count, limit.limit
        );
    }

    pub async fn reset(&self, category: RateCategory) {
        let mut windows = self.windows.lock().await;
        windows[category.index()] = Window::fresh();
    }
}
