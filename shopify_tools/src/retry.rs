//! Exponential backoff for the Admin API.
//!
//! Shopify throttles REST clients with `429 Too Many Requests` and the occasional `5xx`. Calls that fail this way are
//! retried with a growing delay; a `Retry-After` hint from Shopify takes precedence over the computed delay.

use std::{future::Future, time::Duration};

use log::*;
use rand::Rng;

use crate::ShopifyApiError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_delay, ..Default::default() }
    }

    /// `initial_delay * multiplier^attempt`, capped at `max_delay`. `attempt` is zero-based.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let max_ms = self.max_delay.as_millis() as f64;
        Duration::from_millis(delay_ms.min(max_ms).max(0.0) as u64)
    }

    /// Adds up to 10% random jitter so that several stores hitting the same app credentials don't retry in lockstep.
    fn jittered(delay: Duration) -> Duration {
        let spread = delay.as_millis() as u64 / 10;
        if spread == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error, or runs out of attempts.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ShopifyApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ShopifyApiError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("🔁️ {label} succeeded after {} attempts", attempt + 1);
                    }
                    return Ok(value);
                },
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };
            attempt += 1;
            if attempt >= max_attempts {
                warn!("🔁️ {label} failed {attempt} times. Giving up. {err}");
                return Err(ShopifyApiError::RetriesExhausted { attempts: attempt, last_error: err.to_string() });
            }
            let delay = match &err {
                ShopifyApiError::RateLimited(Some(hint)) => (*hint).min(self.max_delay),
                _ => Self::jittered(self.delay_for_attempt(attempt - 1)),
            };
            warn!("🔁️ {label} failed (attempt {attempt}/{max_attempts}). {err}. Retrying in {}ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }
}
