//! Errors returned by a single Spotify API attempt.

use std::time::Duration;
use thiserror::Error;

/// Outcome of one failed call against the accounts or Web API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 429. The call may be repeated after `retry_after`.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Token endpoint rejected the grant (`{"error": ..., "error_description": ...}`).
    #[error("OAuth error {error} (HTTP {status}){}", describe(.description))]
    OAuth {
        status: u16,
        error: String,
        description: Option<String>,
    },

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or timeout failure below HTTP.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A configured base URL cannot carry the request path.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Authorize endpoint answered without a `Location` header.
    #[error("authorize response carried no location header")]
    MissingLocation,
}

impl ApiError {
    /// Grant errors that no amount of retrying will fix.
    pub fn is_revoked_grant(&self) -> bool {
        matches!(
            self,
            ApiError::OAuth { error, .. } if error == "invalid_grant" || error == "invalid_client"
        )
    }
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

/// Result type for Spotify API attempts.
pub type ApiResult<T> = Result<T, ApiError>;
