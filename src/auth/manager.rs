//! Token lifecycle manager.
//!
//! # States
//! ```text
//! Unauthenticated → Exchanging → Active ⇄ Refreshing
//!                        │                    │
//!                        ▼                    ▼
//!               (fatal) Unauthenticated   Terminated (revoked / shutdown)
//! ```
//!
//! # Design Decisions
//! - Codes are exchanged by one tracked worker, in arrival order; callers only wait for the reply
//! - A caller that goes away never cancels its exchange
//! - Only the first token can fail fatally; later failed exchanges leave the active token alone

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::auth::channel::TokenPublisher;
use crate::auth::refresh::{RefreshSchedule, RefreshState, RefreshWorker};
use crate::lifecycle::{FatalError, FatalReporter, Shutdown};
use crate::resilience::{call_with_retry, CallError, RetryPolicy};
use crate::spotify::{ApiError, Credentials, SpotifyApi};

/// Codes allowed to wait behind the one being exchanged.
const PENDING_CODES: usize = 4;

/// Where the token pair currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPhase {
    Unauthenticated,
    Exchanging,
    Active,
    Refreshing,
    Terminated,
}

/// Why an authorization code did not produce a token.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The exchange failed; the failure has been escalated as fatal.
    #[error("authorization code exchange failed: {0}")]
    Rejected(String),

    /// The exchange failed while an earlier token is active. That token is kept.
    #[error("authorization code exchange failed, keeping the current token: {0}")]
    Ignored(String),

    /// Shutdown started before the exchange finished.
    #[error("shutting down")]
    Cancelled,
}

struct ExchangeRequest {
    code: String,
    reply: oneshot::Sender<Result<(), ExchangeError>>,
}

/// Front of the token lifecycle: hands authorization codes to the exchange
/// worker and reports the current phase.
pub struct TokenManager {
    requests: mpsc::Sender<ExchangeRequest>,
    phase: Arc<watch::Sender<TokenPhase>>,
}

impl TokenManager {
    /// Create the manager and start its exchange worker on `shutdown`.
    pub fn new(
        api: Arc<dyn SpotifyApi>,
        credentials: Credentials,
        schedule: RefreshSchedule,
        policy: RetryPolicy,
        publisher: TokenPublisher,
        fatal: FatalReporter,
        shutdown: Shutdown,
    ) -> Self {
        let (phase, _) = watch::channel(TokenPhase::Unauthenticated);
        let phase = Arc::new(phase);
        let (requests, pending) = mpsc::channel(PENDING_CODES);

        let worker = ExchangeWorker {
            api,
            credentials,
            schedule,
            policy,
            publisher,
            fatal,
            phase: phase.clone(),
            cancel: shutdown.token(),
            shutdown: shutdown.clone(),
            pending,
            refresh: None,
        };
        shutdown.spawn("token-exchange", worker.run());

        Self { requests, phase }
    }

    pub fn phase(&self) -> TokenPhase {
        *self.phase.borrow()
    }

    /// Queue an authorization code and wait for its exchange.
    ///
    /// Dropping the returned future does not stop the exchange. A failure while
    /// no token is active is also reported on the fatal channel.
    pub async fn submit_authorization_code(&self, code: &str) -> Result<(), ExchangeError> {
        let (reply, response) = oneshot::channel();
        let request = ExchangeRequest {
            code: code.to_string(),
            reply,
        };
        self.requests
            .send(request)
            .await
            .map_err(|_| ExchangeError::Cancelled)?;
        response.await.unwrap_or(Err(ExchangeError::Cancelled))
    }

    /// Mark the lifecycle finished; called once shutdown has begun.
    pub fn terminate(&self) {
        self.phase.send_replace(TokenPhase::Terminated);
    }
}

/// Exchanges codes one at a time and owns the running refresh worker.
struct ExchangeWorker {
    api: Arc<dyn SpotifyApi>,
    credentials: Credentials,
    schedule: RefreshSchedule,
    policy: RetryPolicy,
    publisher: TokenPublisher,
    fatal: FatalReporter,
    phase: Arc<watch::Sender<TokenPhase>>,
    cancel: CancellationToken,
    shutdown: Shutdown,
    pending: mpsc::Receiver<ExchangeRequest>,
    /// Stop handle of the current refresh worker; `Some` once a token is active.
    refresh: Option<CancellationToken>,
}

impl ExchangeWorker {
    async fn run(mut self) {
        loop {
            let request = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                request = self.pending.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let result = self.exchange(&request.code).await;
            let cancelled = matches!(result, Err(ExchangeError::Cancelled));
            if request.reply.send(result).is_err() {
                tracing::debug!("Callback request closed before its exchange finished");
            }
            if cancelled {
                break;
            }
        }

        self.set_phase(TokenPhase::Terminated);
        tracing::debug!("Token exchange worker stopped");
    }

    async fn exchange(&mut self, code: &str) -> Result<(), ExchangeError> {
        if self.refresh.is_some() {
            tracing::warn!("Authorization code received while a token is active, exchanging again");
        } else {
            self.set_phase(TokenPhase::Exchanging);
        }

        let result = call_with_retry("exchange_token", &self.policy, &self.cancel, || {
            self.api.exchange_code(code, &self.credentials)
        })
        .await;

        let token = match result {
            Ok(token) => token,
            Err(CallError::Cancelled) => {
                self.set_phase(TokenPhase::Terminated);
                return Err(ExchangeError::Cancelled);
            }
            Err(e) => return Err(self.failed(e)),
        };

        let Some(refresh_token) = token.new_refresh_token().map(str::to_string) else {
            let e = CallError::Api(ApiError::Decode(
                "token response carried no refresh token".to_string(),
            ));
            return Err(self.failed(e));
        };

        self.publisher.publish(token.access());
        self.start_refresh_worker(RefreshState {
            refresh_token,
            expires_in: token.expires_in,
        });
        self.set_phase(TokenPhase::Active);

        tracing::info!(
            expires_in = ?token.expires_in,
            scope = %token.scope,
            "Authorization complete, access token issued"
        );
        Ok(())
    }

    fn failed(&self, e: CallError) -> ExchangeError {
        let message = e.to_string();

        if self.refresh.is_some() {
            tracing::warn!(error = %message, "Token exchange failed, keeping the active token");
            return ExchangeError::Ignored(message);
        }

        tracing::error!(error = %message, "Token exchange failed");
        self.set_phase(TokenPhase::Unauthenticated);
        self.fatal.report(FatalError::TokenExchange(e));
        ExchangeError::Rejected(message)
    }

    fn start_refresh_worker(&mut self, state: RefreshState) {
        let stop = self.cancel.child_token();
        if let Some(previous) = self.refresh.replace(stop.clone()) {
            tracing::info!("Stopping previous token refresh worker");
            previous.cancel();
        }

        let worker = RefreshWorker {
            api: self.api.clone(),
            credentials: self.credentials.clone(),
            schedule: self.schedule,
            policy: self.policy.clone(),
            publisher: self.publisher.clone(),
            fatal: self.fatal.clone(),
            phase: self.phase.clone(),
            state,
            cancel: stop,
        };
        self.shutdown.spawn("token-refresh", worker.run());
    }

    fn set_phase(&self, phase: TokenPhase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            tracing::debug!(from = ?previous, to = ?phase, "Token phase changed");
        }
    }
}
