//! Minimum-interval throttle for outbound requests.
//!
//! Each crawl stage asks for its own spacing (1s between team pages, 2s
//! between player and match pages); the limiter remembers when the last
//! request was released and sleeps only for the remainder.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Shared throttle; clones release through the same clock.
#[derive(Clone, Default)]
pub struct RateLimiter {
    last_release: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until at least `min_delay` has passed since the previous release.
    ///
    /// The first call never waits.
    pub async fn acquire(&self, min_delay: Duration) {
        let mut last = self.last_release.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + min_delay;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                debug!("Throttling for {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}
