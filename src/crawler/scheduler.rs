//! Request pacing for listing pages
//!
//! Pages are fetched strictly one after another; the throttle enforces a
//! minimum gap between the start of two consecutive requests.

use std::time::{Duration, Instant};

/// Minimum-interval throttle for sequential requests
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_request_time: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle that allows one request per `min_interval`
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request_time: None,
        }
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was started at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Waits until a request is allowed, then records it
    ///
    /// The first request of a run never waits.
    pub async fn wait_turn(&mut self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::debug!("Waiting {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
        self.record_request(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(1));
        assert_eq!(throttle.time_until_next_request(Instant::now()), None);
    }

    #[test]
    fn test_enforces_minimum_interval() {
        let mut throttle = Throttle::new(Duration::from_millis(1000));
        let start = Instant::now();
        throttle.record_request(start);

        let soon = start + Duration::from_millis(400);
        assert_eq!(
            throttle.time_until_next_request(soon),
            Some(Duration::from_millis(600))
        );

        let later = start + Duration::from_millis(1000);
        assert_eq!(throttle.time_until_next_request(later), None);
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let mut throttle = Throttle::new(Duration::ZERO);
        let now = Instant::now();
        throttle.record_request(now);
        assert_eq!(throttle.time_until_next_request(now), None);
    }

    #[tokio::test]
    async fn test_wait_turn_spaces_requests() {
        let mut throttle = Throttle::new(Duration::from_millis(50));
        let start = Instant::now();

        throttle.wait_turn().await;
        throttle.wait_turn().await;

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(throttle.last_request_time.is_some());
    }
}
