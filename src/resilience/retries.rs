//! Retry logic.
//!
//! # Responsibilities
//! - Execute one remote operation
//! - Detect rate limiting and wait out the server-specified delay
//! - Classify everything else as permanent
//!
//! # Design Decisions
//! - No retry ceiling on rate limits
//! - No retry at all for other failures; callers own their own schedules
//! - The caller's worker is blocked for the whole wait, so never call this while holding a lock

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{RetryConfig, TimeoutConfig};
use crate::observability::metrics;
use crate::resilience::timeouts;
use crate::spotify::ApiError;

/// Final outcome of a wrapped call that did not succeed.
#[derive(Debug, Error)]
pub enum CallError {
    /// The remote side failed permanently.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A single attempt exceeded its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Shutdown was requested while the call was in flight or waiting.
    #[error("call cancelled by shutdown")]
    Cancelled,
}

impl CallError {
    pub fn is_revoked_grant(&self) -> bool {
        matches!(self, CallError::Api(e) if e.is_revoked_grant())
    }
}

/// Parameters of the rate-limit retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Added on top of every `Retry-After` delay.
    pub grace: Duration,
    /// Deadline for one attempt.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(retries: &RetryConfig, timeouts: &TimeoutConfig) -> Self {
        Self {
            grace: Duration::from_millis(retries.rate_limit_grace_ms),
            // The HTTP client enforces its own limits; this catches anything below them.
            attempt_timeout: Duration::from_secs(timeouts.connect_secs + timeouts.request_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), &TimeoutConfig::default())
    }
}

/// Run `op` until it succeeds, fails permanently, or `cancel` fires.
///
/// On `ApiError::RateLimited` the same operation is repeated after
/// `retry_after + policy.grace`.
pub async fn call_with_retry<T, F, Fut>(
    operation: &'static str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CallError::Cancelled),
            outcome = timeouts::attempt(operation, policy.attempt_timeout, op()) => outcome,
        };

        match outcome {
            Ok(Ok(value)) => {
                metrics::record_api_call(operation, "success");
                if attempts > 1 {
                    tracing::debug!(operation, attempts, "Call succeeded after rate limiting");
                }
                return Ok(value);
            }
            Ok(Err(ApiError::RateLimited { retry_after })) => {
                metrics::record_api_call(operation, "rate_limited");
                let wait = retry_after + policy.grace;
                tracing::warn!(
                    operation,
                    attempt = attempts,
                    retry_after_secs = retry_after.as_secs(),
                    wait_ms = wait.as_millis() as u64,
                    "Rate limited, waiting before retry"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(CallError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }
            }
            Ok(Err(e)) => {
                metrics::record_api_call(operation, "failure");
                return Err(CallError::Api(e));
            }
            Err(e) => {
                metrics::record_api_call(operation, "timeout");
                return Err(e);
            }
        }
    }
}
