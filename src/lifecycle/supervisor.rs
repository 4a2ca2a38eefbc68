//! Process supervisor.
//!
//! # Responsibilities
//! - Own the shutdown token, the latest-token channel and the fatal error slot
//! - Start the poller, the callback server and the authorize announcement
//! - Wait for a termination signal or a fatal error, then drain workers
//!
//! # Design Decisions
//! - Signal shutdown is a clean outcome; a fatal error is a failed one
//! - Workers still running after the grace period are abandoned

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::auth::{new_oauth_state, token_channel, RefreshSchedule, TokenManager};
use crate::config::GuardConfig;
use crate::guard::PlaylistGuard;
use crate::http::CallbackServer;
use crate::lifecycle::{fatal_channel, FatalError, FatalReporter, Shutdown};
use crate::resilience::{call_with_retry, CallError, RetryPolicy};
use crate::spotify::SpotifyApi;

/// Why the supervisor returned a failure.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to bind callback listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Runs every worker until shutdown.
pub struct Supervisor {
    config: GuardConfig,
    api: Arc<dyn SpotifyApi>,
    oauth_state: String,
}

impl Supervisor {
    /// `config` must already be validated.
    pub fn new(config: GuardConfig, api: Arc<dyn SpotifyApi>) -> Self {
        Self {
            config,
            api,
            oauth_state: new_oauth_state(),
        }
    }

    /// The `state` value the callback must carry.
    pub fn oauth_state(&self) -> &str {
        &self.oauth_state
    }

    /// Bind the configured address and run until `signal` resolves or a fatal error occurs.
    pub async fn run(self, signal: impl Future<Output = ()>) -> Result<(), RunError> {
        let address = self.config.listener.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| RunError::Bind { address, source })?;
        self.run_on(listener, signal).await
    }

    /// Run with an already bound listener.
    pub async fn run_on(
        self,
        listener: TcpListener,
        signal: impl Future<Output = ()>,
    ) -> Result<(), RunError> {
        let config = &self.config;
        let shutdown = Shutdown::new();
        let (publisher, watcher) = token_channel();
        let (fatal, mut fatal_rx) = fatal_channel();
        let policy = RetryPolicy::from_config(&config.retries, &config.timeouts);

        tracing::info!(
            playlist_id = %config.playlist.id,
            desired_name = %config.playlist.name,
            poll_interval_secs = config.timing.poll_interval_secs,
            refresh_offset_secs = config.timing.refresh_offset_secs,
            "Playlist guard starting"
        );

        let manager = Arc::new(TokenManager::new(
            self.api.clone(),
            config.credentials(),
            RefreshSchedule::from(&config.timing),
            policy.clone(),
            publisher,
            fatal.clone(),
            shutdown.clone(),
        ));

        let guard = PlaylistGuard::new(
            self.api.clone(),
            watcher,
            config.playlist.id.clone(),
            config.playlist.name.clone(),
            config.timing.poll_interval(),
            policy.clone(),
        );
        shutdown.spawn("playlist-guard", guard.run(shutdown.token()));

        let server = CallbackServer::new(manager.clone(), &self.oauth_state, &config.timeouts);
        shutdown.spawn(
            "callback-server",
            serve_callbacks(server, listener, shutdown.token(), fatal.clone()),
        );

        let credentials = config.credentials();
        shutdown.spawn(
            "authorize",
            announce_authorization(
                self.api.clone(),
                credentials.client_id,
                credentials.redirect_uri,
                self.oauth_state.clone(),
                policy,
                shutdown.token(),
            ),
        );

        let outcome = tokio::select! {
            _ = signal => Ok(()),
            Some(error) = fatal_rx.recv() => {
                tracing::error!(error = %error, "Fatal error, shutting down");
                Err(RunError::Fatal(error))
            }
        };

        shutdown.trigger();
        manager.terminate();
        shutdown.drain(config.timing.shutdown_grace()).await;

        tracing::info!(clean = outcome.is_ok(), "Playlist guard stopped");
        outcome
    }
}

async fn serve_callbacks(
    server: CallbackServer,
    listener: TcpListener,
    cancel: CancellationToken,
    fatal: FatalReporter,
) {
    if let Err(e) = server.run(listener, cancel).await {
        tracing::error!(error = %e, "Callback server failed");
        fatal.report(FatalError::CallbackServer(e));
    }
}

/// Log the URL the operator must open to grant access.
async fn announce_authorization(
    api: Arc<dyn SpotifyApi>,
    client_id: String,
    redirect_uri: String,
    state: String,
    policy: RetryPolicy,
    cancel: CancellationToken,
) {
    let fetched = call_with_retry("authorize", &policy, &cancel, || {
        api.authorize(&client_id, &redirect_uri, &state)
    })
    .await;

    match fetched {
        Ok(url) => tracing::info!(url = %url, "Open this URL to authorize playlist access"),
        Err(CallError::Cancelled) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch authorization redirect");
            match api.authorization_url(&client_id, &redirect_uri, &state) {
                Ok(url) => tracing::info!(url = %url, "Open this URL to authorize playlist access"),
                Err(e) => tracing::error!(error = %e, "Failed to build authorization URL"),
            }
        }
    }
}
