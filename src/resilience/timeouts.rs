//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound each remote attempt with a deadline
//! - Report a timed-out attempt as its own error kind
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timeout is a permanent failure of that call, never a rate limit

use std::future::Future;
use std::time::Duration;

use crate::resilience::retries::CallError;

/// Run one attempt, failing with `CallError::Timeout` once `limit` elapses.
pub async fn attempt<F, T, E>(operation: &'static str, limit: Duration, fut: F) -> Result<Result<T, E>, CallError>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result),
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "Remote call timed out");
            Err(CallError::Timeout(limit))
        }
    }
}
