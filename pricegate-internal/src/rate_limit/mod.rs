pub mod limiter;

pub use limiter::ScraperRateLimiter;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics for rate limiter performance monitoring
#[derive(Debug, Default)]
pub struct RateLimiterMetrics {
    pub acquires: AtomicU64,
    pub waits: AtomicU64,
    pub wait_ms_total: AtomicU64,
}

impl RateLimiterMetrics {
    pub fn record_acquire(&self) {
        self.acquires.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wait(&self, wait: Duration) {
        self.waits.fetch_add(1, Ordering::Relaxed);
        self.wait_ms_total
            .fetch_add(wait.as_millis() as u64, Ordering::Relaxed);
    }
}
