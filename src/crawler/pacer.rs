//! Global politeness delay between outbound requests

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces request starts by a minimum delay, shared by every worker
///
/// The delay applies per outbound request, not per domain: with a delay of one
/// second the whole crawler issues at most one request per second.
#[derive(Debug)]
pub struct RequestPacer {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// Creates a pacer from a delay in milliseconds
    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    /// The configured spacing between requests
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until this caller may send its request
    ///
    /// Each caller reserves the next free slot under the lock and then sleeps
    /// outside of it, so waiting workers do not serialize on the sleep.
    pub async fn wait_turn(&self) {
        if self.delay.is_zero() {
            return;
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next_slot = Some(slot + self.delay);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_delay_never_waits() {
        let pacer = RequestPacer::from_millis(0);
        let start = Instant::now();
        for _ in 0..100 {
            pacer.wait_turn().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let pacer = RequestPacer::from_millis(30);
        let start = Instant::now();

        pacer.wait_turn().await;
        pacer.wait_turn().await;
        pacer.wait_turn().await;

        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_concurrent_callers_get_distinct_slots() {
        let pacer = std::sync::Arc::new(RequestPacer::from_millis(20));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pacer = pacer.clone();
            handles.push(tokio::spawn(async move {
                pacer.wait_turn().await;
                Instant::now()
            }));
        }

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }
        finished.sort();

        assert!(finished[3].duration_since(start) >= Duration::from_millis(60));
    }
}
