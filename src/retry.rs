//! Bounded retry with exponential backoff for page fetches.
//!
//! The default policy makes a single attempt; retries are opt-in through
//! `scraper.fetch_retries`.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fetch(0)
    }
}

impl RetryConfig {
    /// Page-fetch policy: 1s, 2s, 4s ... capped at 30s.
    pub fn fetch(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or the retries are used up.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, what: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", what, attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    what,
                    attempt + 1,
                    config.max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_failures(
        counter: Arc<AtomicU32>,
        failures: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, String>> {
        move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if attempt < failures {
                Err(format!("HTTP 503 on attempt {}", attempt + 1))
            } else {
                Ok(attempt)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_makes_single_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let op = counting_failures(counter.clone(), 1);
        let result = retry(&RetryConfig::default(), "fetch", op).await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_within_budget() {
        let counter = Arc::new(AtomicU32::new(0));
        let op = counting_failures(counter.clone(), 2);
        let result = retry(&RetryConfig::fetch(3), "fetch", op).await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let counter = Arc::new(AtomicU32::new(0));
        let op = counting_failures(counter.clone(), 10);
        let result = retry(&RetryConfig::fetch(2), "fetch", op).await;

        assert_eq!(result.unwrap_err(), "HTTP 503 on attempt 3");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig::fetch(10);
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(8), Duration::from_secs(30));
    }
}
