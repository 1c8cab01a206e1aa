//! Bounded exponential backoff for idempotent upstream calls.

use derive_builder::Builder;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included.
    #[builder(default = "3")]
    pub max_attempts: u32,
    #[builder(default = "Duration::from_millis(500)")]
    pub base_delay: Duration,
    #[builder(default = "Duration::from_secs(4)")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

/// The error that ended a retried operation and how many attempts were made.
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sleep before retry `retry` (1-based): `base * 2^(retry-1)`, capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Run `operation` until it succeeds, returns an error `retryable` rejects,
    /// or the attempt budget is spent.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        label: &str,
        mut operation: F,
        retryable: P,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= max_attempts || !retryable(&error) => {
                    return Err(RetryFailure {
                        error,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        %error,
                        attempt,
                        max_attempts,
                        next_retry_ms = delay.as_millis() as u64,
                        "{label} failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
