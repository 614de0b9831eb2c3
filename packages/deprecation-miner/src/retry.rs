//! Resilient call client.
//!
//! Every outbound call (page fetch, generation request) goes through one
//! [`RetryPolicy`] so they share the same bounded, deterministic backoff.
//!
//! ```rust,ignore
//! use deprecation_miner::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::default(); // 3 attempts, 1s base
//! let body = policy.call(|| async { client.get(url).send().await }).await?;
//! ```
//!
//! The delay before attempt `k` (1-indexed, `k >= 2`) is `base * 2^(k-2)`:
//! 1, 2, 4, ... units. There is no jitter.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{CallError, Transient};

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than 1.
    pub max_attempts: u32,

    /// One backoff time unit.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given bound and time unit.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait before `attempt` (1-indexed). Zero for the first attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Run `op` until it succeeds, fails permanently, or the bound is hit.
    ///
    /// Errors whose [`Transient::is_transient`] is false fail immediately with
    /// [`CallError::Rejected`] without consuming further attempts. Running out
    /// of attempts yields [`CallError::Exhausted`] with the last error.
    pub async fn call<F, Fut, T, E>(&self, mut op: F) -> Result<T, CallError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Transient + 'static,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retry: backing off");
                tokio::time::sleep(delay).await;
            }

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "retry: succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_transient() => {
                    warn!(attempt, error = %e, "retry: non-retryable failure");
                    return Err(CallError::Rejected(e));
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(attempts = attempt, error = %e, "retry: all attempts exhausted");
                    return Err(CallError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    warn!(attempt, max = max_attempts, error = %e, "retry: attempt failed");
                    attempt += 1;
                }
            }
        }
    }
}
