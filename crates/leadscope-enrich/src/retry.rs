//! Bounded exponential backoff for adapter calls.
//!
//! Transient failures are retried; terminal classes (not-found, quota,
//! credentials, parse) are propagated immediately via each error type's
//! [`RetryClass`] implementation. Backoff timing is explicit here, never
//! inherited from queue or HTTP library defaults, so tests control it.

use std::future::Future;
use std::time::Duration;

use leadscope_core::RetryClass;

/// Backoff schedule for one wrapped adapter call.
///
/// The delay before attempt *n* (n ≥ 2) is `base_delay * factor^(n-2)`,
/// capped at `max_delay`. With the defaults that is 1 s, 2 s — and a
/// third failure surfaces the error.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            factor: 2,
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Builds a policy from configured values.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms),
            factor: 2,
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Delay before attempt `attempt` (1-based); `None` for the first.
    fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt < 2 {
            return None;
        }
        let exponent = (attempt - 2).min(31);
        let multiplier = u64::from(self.factor).saturating_pow(exponent);
        let delay = self
            .base_delay
            .saturating_mul(u32::try_from(multiplier.min(u64::from(u32::MAX))).unwrap_or(u32::MAX));
        Some(delay.min(self.max_delay))
    }
}

/// Executes `operation` with bounded exponential backoff.
///
/// On success the result is returned immediately. On a retryable error
/// (per [`RetryClass::is_retryable`]) the call sleeps for the scheduled
/// delay and tries again, up to `policy.max_attempts` total attempts.
/// Exhausting retries surfaces the last error unchanged; a terminal
/// error is surfaced without sleeping.
///
/// The sleep suspends only the calling task.
///
/// # Errors
///
/// Returns the final adapter error once retries are exhausted or the
/// error is terminal.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: RetryClass + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= policy.max_attempts {
                    return Err(err);
                }

                let next_attempt = attempt + 1;
                let delay = policy.delay_before(next_attempt).unwrap_or_default();
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient adapter error - retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt = next_attempt;
            }
        }
    }
}
