use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::rate_limit::RateLimiterMetrics;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket bounding the outbound extract request rate.
///
/// `acquire` suspends the caller until a token is available and never fails.
/// The bucket state is kept behind a `tokio::sync::Mutex` that is held across
/// the suspension, so concurrent callers are funneled through one at a time
/// and the `0 <= tokens <= max_tokens` invariant holds without further
/// coordination.
#[derive(Debug)]
pub struct ScraperRateLimiter {
    state: Mutex<BucketState>,
    max_tokens: u32,
    refill_per_minute: u32,
    metrics: RateLimiterMetrics,
}

impl ScraperRateLimiter {
    pub fn new(max_tokens: u32, refill_per_minute: u32) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: f64::from(max_tokens),
                last_refill: Instant::now(),
            }),
            max_tokens,
            refill_per_minute: refill_per_minute.max(1),
            metrics: RateLimiterMetrics::default(),
        }
    }

    /// Milliseconds between token mints at the configured refill rate.
    fn refill_period(&self) -> Duration {
        Duration::from_millis(60_000 / u64::from(self.refill_per_minute))
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        self.metrics.record_acquire();

        let mut state = self.state.lock().await;

        let now = Instant::now();
        let period = self.refill_period();
        let elapsed = now.duration_since(state.last_refill);
        let minted = (elapsed.as_millis() / period.as_millis()) as f64;
        state.tokens = (state.tokens + minted).min(f64::from(self.max_tokens));
        state.last_refill = now;

        if state.tokens < 1.0 {
            let elapsed_ms = elapsed.as_millis() as u64;
            let period_ms = period.as_millis() as u64;
            let wait = Duration::from_millis(period_ms - (elapsed_ms % period_ms));
            debug!(
                wait_ms = wait.as_millis() as u64,
                "Rate limiter exhausted, waiting for next token"
            );
            self.metrics.record_wait(wait);
            tokio::time::sleep(wait).await;
            state.last_refill = Instant::now();
            state.tokens = 1.0;
        }

        state.tokens -= 1.0;
    }

    pub fn metrics(&self) -> &RateLimiterMetrics {
        &self.metrics
    }
}
