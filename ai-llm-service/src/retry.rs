//! Retry with clamped exponential backoff for generation calls.
//!
//! After the n-th failed attempt the caller sleeps
//! `clamp(multiplier * 2^(n-1), min_wait, max_wait)`; with the defaults
//! (3 attempts, 1s multiplier, 2s..10s) that is 2s then 2s.
//! Only [`AiLlmError::is_transient`] failures are retried.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::error_handler::AiLlmError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `0` is treated as `1`.
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff to apply after the `failed_attempt`-th failure (1-based).
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(failed_attempt.saturating_sub(1));
        self.multiplier
            .saturating_mul(exp)
            .max(self.min_wait)
            .min(self.max_wait)
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent. The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, AiLlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AiLlmError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < attempts && e.is_transient() => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        label,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "generation request failed. Retrying..."
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(label, attempt, error = %e, "generation request failed permanently");
                    return Err(e);
                }
            }
        }
    }
}
