//! Back-off policy for backend calls.
//!
//! Transient failures (network errors, 429, 5xx) are retried; everything else
//! is returned immediately so a rejected message is never re-sent blindly.

use std::future::Future;
use std::time::Duration;

use placerank_core::AppConfig;

use crate::error::MessagingError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &MessagingError) -> bool {
    match err {
        MessagingError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        MessagingError::Api { status, .. } => *status == 429 || *status >= 500,
        MessagingError::Deserialize { .. }
        | MessagingError::InvalidBaseUrl { .. }
        | MessagingError::InvalidTransition { .. }
        | MessagingError::InvalidPlan(_)
        | MessagingError::PlanFileIo { .. }
        | MessagingError::PlanFileParse(_) => false,
    }
}

/// How often and how patiently a failing backend call is retried.
///
/// Retry `n` (1-based) waits `backoff_base × 2ⁿ⁻¹`, jittered by ±25 % and
/// never longer than `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            backoff_base: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.retry_backoff_base_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Un-jittered delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base.saturating_mul(factor).min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let factor = rand::random_range(0.75..=1.25);
        Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Run `operation`, retrying transient failures until the policy gives up.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        what: &'static str,
        mut operation: F,
    ) -> Result<T, MessagingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MessagingError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.max_retries && is_retriable(&e) => e,
                Err(e) => return Err(e),
            };
            retry += 1;
            let delay = self.jittered(self.delay_before(retry));
            tracing::warn!(
                what,
                retry,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "backend call failed transiently; backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
