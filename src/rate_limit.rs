//! Token bucket admission gate.
//!
//! Tokens refill lazily on every acquisition attempt. Waiters queue on a
//! fair (FIFO) async mutex; the holder of the lock is the only task that
//! sleeps for a refill, so there is never more than one drain in progress.

use std::time::Duration;

use tokio::{
    sync::Mutex,
    time::{sleep, Instant},
};

use crate::RateLimitMode;

/// Burst size used by [`RateLimitMode::Auto`].
pub const AUTO_CAPACITY: u32 = 10;
/// Refill rate used by [`RateLimitMode::Auto`], in tokens per millisecond.
pub const AUTO_REFILL_PER_MS: f64 = 0.029;

/// Continuously refilling token bucket with FIFO waiters.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_ms: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket. `capacity` is raised to at least 1 and a
    /// non-positive refill rate is rejected with `None`.
    pub fn new(capacity: u32, refill_per_ms: f64) -> Option<Self> {
        if !refill_per_ms.is_finite() || refill_per_ms <= 0.0 {
            return None;
        }
        let capacity = f64::from(capacity.max(1));
        Some(Self {
            capacity,
            refill_per_ms,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    /// Builds the bucket for a mode, or `None` when rate limiting is disabled.
    pub fn from_mode(mode: &RateLimitMode) -> Option<Self> {
        match mode {
            RateLimitMode::Disabled => None,
            RateLimitMode::Auto => Self::new(AUTO_CAPACITY, AUTO_REFILL_PER_MS),
            RateLimitMode::Interval(interval) => {
                let interval_ms = (interval.as_secs_f64() * 1000.0).max(1.0);
                Self::new(1, 1.0 / interval_ms)
            }
        }
    }

    /// Maximum burst size.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Tokens added per elapsed millisecond.
    pub fn refill_per_ms(&self) -> f64 {
        self.refill_per_ms
    }

    /// Waits until a token is available and consumes it.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        loop {
            self.refill(&mut state);
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return;
            }

            let wait_ms = (1.0 - state.tokens) / self.refill_per_ms;

            #[cfg(feature = "tracing")]
            tracing::debug!("rate limit reached, waiting {:.1} ms for a token", wait_ms);

            sleep(Duration::try_from_secs_f64(wait_ms / 1000.0).unwrap_or(Duration::MAX)).await;
        }
    }

    /// Returns the token count after refilling, without consuming anything.
    ///
    /// Shares the waiter queue with [`TokenBucket::acquire`], so while a
    /// drain is in progress this resolves only after every acquirer queued
    /// before it has been served.
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed_ms = now.saturating_duration_since(state.last_refill).as_secs_f64() * 1000.0;
        state.tokens = (state.tokens + elapsed_ms * self.refill_per_ms).min(self.capacity);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::time::Instant;

    use super::{TokenBucket, AUTO_CAPACITY};
    use crate::RateLimitMode;

    #[test]
    fn disabled_mode_has_no_bucket() {
        assert!(TokenBucket::from_mode(&RateLimitMode::Disabled).is_none());
    }

    #[test]
    fn rejects_non_positive_refill_rate() {
        assert!(TokenBucket::new(1, 0.0).is_none());
        assert!(TokenBucket::new(1, -1.0).is_none());
    }

    #[test]
    fn interval_mode_has_no_burst() {
        let bucket =
            TokenBucket::from_mode(&RateLimitMode::Interval(Duration::from_secs(2))).unwrap();
        assert_eq!(bucket.capacity(), 1.0);
        assert!((bucket.refill_per_ms() - 0.0005).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_mode_bursts_then_throttles() {
        let bucket = TokenBucket::from_mode(&RateLimitMode::Auto).unwrap();
        let start = Instant::now();

        for _ in 0..AUTO_CAPACITY {
            bucket.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        bucket.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(34));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_never_exceed_capacity() {
        let bucket = TokenBucket::new(3, 0.5).unwrap();
        assert_eq!(bucket.available().await, 3.0);

        bucket.acquire().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(bucket.available().await, 3.0);

        for _ in 0..3 {
            bucket.acquire().await;
        }
        let available = bucket.available().await;
        assert!((0.0..=3.0).contains(&available));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_mode_spaces_acquisitions() {
        let bucket =
            TokenBucket::from_mode(&RateLimitMode::Interval(Duration::from_secs(1))).unwrap();
        let mut previous = Instant::now();
        bucket.acquire().await;

        for _ in 0..3 {
            bucket.acquire().await;
            let now = Instant::now();
            assert!(now - previous >= Duration::from_secs(1));
            previous = now;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_are_served_in_arrival_order() {
        let bucket = Arc::new(
            TokenBucket::from_mode(&RateLimitMode::Interval(Duration::from_secs(1))).unwrap(),
        );
        bucket.acquire().await;

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for id in 0..4 {
            let bucket = Arc::clone(&bucket);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                bucket.acquire().await;
                order.lock().unwrap().push((id, Instant::now()));
            }));
            // Let the task reach the bucket queue before spawning the next one.
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let order = order.lock().unwrap();
        let ids: Vec<_> = order.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        for pair in order.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_secs(1));
        }
    }
}
