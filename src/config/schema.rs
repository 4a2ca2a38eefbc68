//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::spotify::Credentials;

/// Root configuration for the playlist guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Callback listener settings.
    pub listener: ListenerConfig,

    /// The guarded playlist and its desired name.
    pub playlist: PlaylistConfig,

    /// OAuth client registration.
    pub oauth: OAuthConfig,

    /// Spotify endpoints.
    pub spotify: SpotifyConfig,

    /// Poll, refresh and shutdown timing.
    pub timing: TimingConfig,

    /// Per-call network timeouts.
    pub timeouts: TimeoutConfig,

    /// Rate-limit retry settings.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GuardConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.oauth.client_id.clone(),
            client_secret: self.oauth.client_secret.clone(),
            redirect_uri: self.oauth.redirect_uri.clone(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The playlist to protect.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Spotify playlist ID.
    pub id: String,

    /// Name the playlist must keep.
    pub name: String,
}

/// OAuth client registration.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,

    /// Must match the redirect URI registered for the app.
    pub redirect_uri: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Spotify endpoints. Overridable so tests can point at a mock server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Accounts service base URL (authorize and token endpoints).
    pub accounts_url: String,

    /// Web API base URL.
    pub api_url: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            accounts_url: "https://accounts.spotify.com".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
        }
    }
}

/// Scheduling of the background workers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds between playlist checks.
    pub poll_interval_secs: u64,

    /// Seconds before token expiry at which to refresh.
    pub refresh_offset_secs: u64,

    /// Seconds to wait before retrying a failed refresh.
    pub refresh_retry_secs: u64,

    /// Seconds to wait for workers to drain on shutdown.
    pub shutdown_grace_secs: u64,
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn refresh_offset(&self) -> Duration {
        Duration::from_secs(self.refresh_offset_secs)
    }

    pub fn refresh_retry(&self) -> Duration {
        Duration::from_secs(self.refresh_retry_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            refresh_offset_secs: 60,
            refresh_retry_secs: 1,
            shutdown_grace_secs: 5,
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for handling one inbound callback request in seconds.
    pub callback_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 15,
            // Covers a token exchange that waits out a rate limit.
            callback_secs: 120,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Milliseconds added to every Retry-After delay.
    pub rate_limit_grace_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limit_grace_ms: 500,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of pretty output.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: true,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
