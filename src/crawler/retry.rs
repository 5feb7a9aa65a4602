//! Retry with exponential backoff for API calls

use crate::config::RetryConfig;
use crate::crawler::fetcher::{FetchError, FetchFailure};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry policy applied uniformly to every endpoint call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to each backoff
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// Exponential backoff before retry number `retry` (1-based): base * 2^(retry-1)
    pub fn backoff_duration(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Runs `attempt_fn` until it succeeds or the attempt cap is reached
    ///
    /// Sleeps `backoff_duration(n) + jitter` before retry `n`. Exhaustion
    /// returns the last error together with the number of attempts made.
    pub async fn run<T, F, Fut>(&self, label: &str, mut attempt_fn: F) -> Result<T, FetchFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            if attempt > 0 {
                tokio::time::sleep(self.backoff_duration(attempt) + self.jitter()).await;
            }
            attempt += 1;

            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_attempts => {
                    tracing::warn!(
                        "{}: attempt {}/{} failed: {}, retrying...",
                        label,
                        attempt,
                        self.max_attempts,
                        error
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        "{}: giving up after {} attempt(s): {}",
                        label,
                        attempt,
                        error
                    );
                    return Err(FetchFailure {
                        error,
                        attempts: attempt,
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
