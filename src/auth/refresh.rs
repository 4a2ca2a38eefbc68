//! Background token refresh.
//!
//! # Responsibilities
//! - Wait until shortly before the access token expires
//! - Refresh through the retry wrapper and republish the new access token
//! - Keep the previous refresh token when the response carries none
//! - Retry quickly after a failed refresh, escalate a revoked grant
//!
//! # Design Decisions
//! - The interval is recomputed from every response, never from the first token
//! - Retry delay also floors the interval so short-lived tokens cannot hot-loop
//! - The worker only exits on cancellation, even after escalating

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::auth::channel::TokenPublisher;
use crate::auth::manager::TokenPhase;
use crate::config::TimingConfig;
use crate::lifecycle::{FatalError, FatalReporter};
use crate::observability::metrics;
use crate::resilience::{call_with_retry, CallError, RetryPolicy};
use crate::spotify::{Credentials, SpotifyApi};

/// What the refresh worker carries between iterations.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshState {
    pub refresh_token: String,
    /// Lifetime of the most recent access token, as reported by the server.
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for RefreshState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshState")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Timing rules for refresh.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSchedule {
    /// Subtracted from the token lifetime.
    pub offset: Duration,
    /// Wait after a failed refresh; also the shortest interval ever used.
    pub retry_delay: Duration,
}

impl RefreshSchedule {
    /// Time from receiving a token until it should be refreshed.
    pub fn next_refresh(&self, expires_in: Option<u64>) -> Duration {
        let interval = match expires_in {
            Some(secs) => Duration::from_secs(secs).saturating_sub(self.offset),
            None => self.offset,
        };
        interval.max(self.retry_delay)
    }
}

impl From<&TimingConfig> for RefreshSchedule {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            offset: timing.refresh_offset(),
            retry_delay: timing.refresh_retry(),
        }
    }
}

/// Long-running refresh loop for one token pair.
pub struct RefreshWorker {
    pub(crate) api: Arc<dyn SpotifyApi>,
    pub(crate) credentials: Credentials,
    pub(crate) schedule: RefreshSchedule,
    pub(crate) policy: RetryPolicy,
    pub(crate) publisher: TokenPublisher,
    pub(crate) fatal: FatalReporter,
    pub(crate) phase: Arc<watch::Sender<TokenPhase>>,
    pub(crate) state: RefreshState,
    pub(crate) cancel: CancellationToken,
}

impl RefreshWorker {
    pub async fn run(mut self) {
        let mut wait = self.schedule.next_refresh(self.state.expires_in);
        tracing::debug!(
            next_refresh_secs = wait.as_secs(),
            expires_in = ?self.state.expires_in,
            "Token refresh worker started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            self.phase.send_replace(TokenPhase::Refreshing);

            match self.refresh_once().await {
                Ok(()) => {
                    metrics::record_token_refresh("success");
                    self.phase.send_replace(TokenPhase::Active);
                    wait = self.schedule.next_refresh(self.state.expires_in);
                    tracing::info!(
                        next_refresh_secs = wait.as_secs(),
                        "Access token refreshed"
                    );
                }
                Err(CallError::Cancelled) => break,
                Err(e) if e.is_revoked_grant() => {
                    metrics::record_token_refresh("revoked");
                    tracing::error!(error = %e, "Refresh grant rejected, cannot keep the token alive");
                    self.phase.send_replace(TokenPhase::Terminated);
                    self.fatal.report(FatalError::RefreshRevoked(e));
                    self.cancel.cancelled().await;
                    break;
                }
                Err(e) => {
                    metrics::record_token_refresh("failure");
                    self.phase.send_replace(TokenPhase::Active);
                    wait = self.schedule.retry_delay;
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = wait.as_millis() as u64,
                        "Token refresh failed, retrying"
                    );
                }
            }
        }

        tracing::debug!("Token refresh worker stopped");
    }

    async fn refresh_once(&mut self) -> Result<(), CallError> {
        let token = call_with_retry("refresh_token", &self.policy, &self.cancel, || {
            self.api
                .refresh_token(&self.state.refresh_token, &self.credentials)
        })
        .await?;

        if let Some(rotated) = token.new_refresh_token() {
            tracing::debug!("Refresh token rotated");
            self.state.refresh_token = rotated.to_string();
        }
        self.state.expires_in = token.expires_in;
        self.publisher.publish(token.access());
        Ok(())
    }
}
