//! Protection poller.
//!
//! # Responsibilities
//! - Pick up the newest access token without blocking
//! - Read the playlist and compare its name byte for byte
//! - Issue one correcting update when it drifted
//!
//! # Design Decisions
//! - Failures never leave the loop; the next tick is the retry
//! - Ticks that fall behind are delayed, not bunched

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::auth::TokenWatcher;
use crate::observability::metrics;
use crate::resilience::{call_with_retry, CallError, RetryPolicy};
use crate::spotify::{PlaylistUpdate, SpotifyApi};

/// Result of one read-compare-correct cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No access token has been issued yet.
    NoToken,
    InSync,
    /// The name had drifted and was set back.
    Corrected,
    FetchFailed,
    CorrectionFailed,
    /// Shutdown interrupted the cycle.
    Cancelled,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::NoToken => "no_token",
            CycleOutcome::InSync => "in_sync",
            CycleOutcome::Corrected => "corrected",
            CycleOutcome::FetchFailed => "fetch_failed",
            CycleOutcome::CorrectionFailed => "correction_failed",
            CycleOutcome::Cancelled => "cancelled",
        }
    }
}

/// Keeps one playlist's name at the desired value.
pub struct PlaylistGuard {
    api: Arc<dyn SpotifyApi>,
    tokens: TokenWatcher,
    playlist_id: String,
    desired_name: String,
    interval: Duration,
    policy: RetryPolicy,
}

impl PlaylistGuard {
    pub fn new(
        api: Arc<dyn SpotifyApi>,
        tokens: TokenWatcher,
        playlist_id: impl Into<String>,
        desired_name: impl Into<String>,
        interval: Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            tokens,
            playlist_id: playlist_id.into(),
            desired_name: desired_name.into(),
            interval,
            policy,
        }
    }

    /// Poll until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            playlist_id = %self.playlist_id,
            desired_name = %self.desired_name,
            interval_secs = self.interval.as_secs(),
            "Playlist guard starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if self.check_once(&cancel).await == CycleOutcome::Cancelled {
                break;
            }
        }

        tracing::info!("Playlist guard stopped");
    }

    /// One read-compare-correct cycle.
    pub async fn check_once(&mut self, cancel: &CancellationToken) -> CycleOutcome {
        let outcome = self.cycle(cancel).await;
        metrics::record_poll_cycle(outcome.as_str());
        tracing::debug!(outcome = outcome.as_str(), "Poll cycle finished");
        outcome
    }

    async fn cycle(&mut self, cancel: &CancellationToken) -> CycleOutcome {
        let Some(token) = self.tokens.latest().cloned() else {
            tracing::debug!("No access token yet, skipping cycle");
            return CycleOutcome::NoToken;
        };

        let api = &self.api;
        let playlist_id = self.playlist_id.as_str();
        let fetched = call_with_retry("get_playlist", &self.policy, cancel, || {
            api.get_playlist(&token, playlist_id)
        })
        .await;

        let playlist = match fetched {
            Ok(playlist) => playlist,
            Err(CallError::Cancelled) => return CycleOutcome::Cancelled,
            Err(e) => {
                tracing::warn!(playlist_id, error = %e, "Failed to fetch playlist");
                return CycleOutcome::FetchFailed;
            }
        };

        if playlist.name == self.desired_name {
            metrics::record_in_sync(true);
            tracing::debug!(playlist_id, name = %playlist.name, "Playlist name unchanged");
            return CycleOutcome::InSync;
        }

        metrics::record_in_sync(false);
        tracing::info!(
            playlist_id,
            observed = %playlist.name,
            desired = %self.desired_name,
            "Playlist name changed, restoring"
        );

        // A refresh may have landed during the fetch.
        let token = self.tokens.latest().cloned().unwrap_or(token);
        let update = PlaylistUpdate {
            name: self.desired_name.clone(),
        };
        let api = &self.api;
        let playlist_id = self.playlist_id.as_str();
        let corrected = call_with_retry("update_playlist", &self.policy, cancel, || {
            api.update_playlist(&token, playlist_id, &update)
        })
        .await;

        match corrected {
            Ok(()) => {
                metrics::record_in_sync(true);
                tracing::info!(playlist_id, name = %update.name, "Playlist name restored");
                CycleOutcome::Corrected
            }
            Err(CallError::Cancelled) => CycleOutcome::Cancelled,
            Err(e) => {
                tracing::warn!(playlist_id, error = %e, "Failed to restore playlist name");
                CycleOutcome::CorrectionFailed
            }
        }
    }
}
