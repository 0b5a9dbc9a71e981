//! Request pacing for a single crawl run
//!
//! The limiter enforces a minimum gap between requests, slowly widens that
//! gap as the run goes on, computes exponential backoff after rate-limit
//! signals, and owns the rotating user-agent identity.

use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Every this many requests the delay is widened
const ESCALATION_INTERVAL: u64 = 10;

/// Escalation never pushes the delay past this (unless the base is larger)
const ESCALATION_CEILING: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct RateLimiter {
    base_delay: Duration,
    current_delay: Duration,
    request_count: u64,
    last_request: Option<Instant>,
    identities: Vec<String>,
    identity_index: usize,
}

impl RateLimiter {
    pub fn new(base_delay: Duration, identities: Vec<String>) -> Self {
        Self {
            base_delay,
            current_delay: base_delay,
            request_count: 0,
            last_request: None,
            identities,
            identity_index: 0,
        }
    }

    /// Sleeps until `current_delay` has passed since the previous request
    ///
    /// Records the request afterwards. Every tenth request widens the delay
    /// by 20%, up to the escalation ceiling.
    pub async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.current_delay {
                sleep(self.current_delay - elapsed).await;
            }
        }

        self.last_request = Some(Instant::now());
        self.request_count += 1;

        if self.request_count % ESCALATION_INTERVAL == 0 {
            self.escalate();
        }
    }

    fn escalate(&mut self) {
        let ceiling = ESCALATION_CEILING.max(self.base_delay);
        // x1.2
        let widened = self
            .current_delay
            .checked_mul(6)
            .map_or(ceiling, |d| d / 5)
            .min(ceiling);

        if widened != self.current_delay {
            tracing::debug!(
                "Widening request delay from {:?} to {:?} after {} requests",
                self.current_delay,
                widened,
                self.request_count
            );
        }
        self.current_delay = widened;
    }

    /// Backoff for the given zero-based attempt: `2^attempt × current_delay`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.current_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Sleeps for [`backoff_delay`](Self::backoff_delay) and returns the wait
    pub async fn backoff(&mut self, attempt: u32) -> Duration {
        let wait = self.backoff_delay(attempt);
        sleep(wait).await;
        self.last_request = Some(Instant::now());
        wait
    }

    /// Switches to the next identity in the pool and returns it
    pub fn rotate_identity(&mut self) -> Option<&str> {
        if self.identities.is_empty() {
            return None;
        }
        self.identity_index = (self.identity_index + 1) % self.identities.len();
        self.current_identity()
    }

    pub fn current_identity(&self) -> Option<&str> {
        self.identities.get(self.identity_index).map(String::as_str)
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }
}
