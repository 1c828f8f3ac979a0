//! Token bucket throttling transfer throughput.
//!
//! Tokens are bytes. They are added at the configured rate up to one second
//! worth of burst. A reservation larger than the available tokens drives the
//! bucket into debt, and the caller sleeps until the debt is repaid.

use tokio::time::{Duration, Instant};

/// Byte-rate token bucket for a single transfer.
#[derive(Debug)]
pub struct ByteRateLimiter {
    /// Max tokens (= bytes per second).
    capacity: f64,
    /// Current available tokens; negative while in debt.
    tokens: f64,
    /// Tokens added per second.
    refill_rate: f64,
    /// Last refill time.
    last_refill: Instant,
}

impl ByteRateLimiter {
    /// Create a limiter capped at `bytes_per_second`.
    ///
    /// The bucket starts full, allowing an immediate one-second burst.
    pub fn new(bytes_per_second: u64) -> Self {
        let capacity = bytes_per_second.max(1) as f64;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity,
            last_refill: Instant::now(),
        }
    }

    pub fn bytes_per_second(&self) -> u64 {
        self.capacity as u64
    }

    /// Reserve `bytes` and return how long the caller must wait before
    /// sending them to stay under the ceiling.
    pub fn reserve(&mut self, bytes: u64) -> Duration {
        self.refill();
        self.tokens -= bytes as f64;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / self.refill_rate)
        }
    }

    /// Reserve `bytes`, sleeping as long as required.
    pub async fn acquire(&mut self, bytes: u64) {
        let wait = self.reserve(bytes);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_capacity_is_free() {
        let mut limiter = ByteRateLimiter::new(1000);
        assert_eq!(limiter.reserve(400), Duration::ZERO);
        assert_eq!(limiter.reserve(600), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debt_translates_to_wait() {
        let mut limiter = ByteRateLimiter::new(1000);
        assert_eq!(limiter.reserve(1000), Duration::ZERO);
        let wait = limiter.reserve(500);
        assert_eq!(wait, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_over_time() {
        let mut limiter = ByteRateLimiter::new(1000);
        limiter.reserve(1000);
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(limiter.reserve(250), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_enforces_ceiling() {
        let mut limiter = ByteRateLimiter::new(1000);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire(1000).await;
        }
        // One second of burst, then four seconds at 1000 B/s.
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_zero_rate_is_clamped() {
        let limiter = ByteRateLimiter::new(0);
        assert_eq!(limiter.bytes_per_second(), 1);
    }
}
