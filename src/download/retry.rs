//! Retry logic for page, playlist and segment requests

use crate::error::GrabError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

/// Retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `func` until it succeeds, fails with a non-retryable error,
    /// or `max_retries` retries have been spent. `what` names the
    /// resource in log lines ("segment 3", a page URL).
    pub async fn execute<F, Fut, T>(&self, what: &str, mut func: F) -> Result<T, GrabError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GrabError>>,
    {
        let mut delay = self.config.initial_delay;
        let mut attempt = 0;

        loop {
            let error = match func().await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(error);
            }
            if attempt >= self.config.max_retries {
                debug!("Giving up on {} after {} attempt(s)", what, attempt + 1);
                return Err(error);
            }

            attempt += 1;
            warn!(
                "Fetching {} failed ({}/{}): {}, retrying in {:?}",
                what,
                attempt,
                self.config.max_retries + 1,
                error,
                delay
            );
            tokio::time::sleep(delay + self.jitter(delay)).await;
            delay = self.next_delay(delay);
        }
    }

    /// Random extra delay of up to `jitter_factor * delay`
    fn jitter(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return Duration::ZERO;
        }
        let jitter_range = delay.as_millis() as f64 * self.config.jitter_factor.min(1.0);
        Duration::from_millis((rand::random::<f64>() * jitter_range) as u64)
    }

    /// Exponential backoff capped at `max_delay`
    fn next_delay(&self, delay: Duration) -> Duration {
        let next = Duration::from_millis(
            (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
        );
        next.min(self.config.max_delay)
    }
}
