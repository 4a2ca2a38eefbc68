//! Fatal error reporting.
//!
//! Any worker may report; only the first report is kept. The supervisor
//! owns the single receiver and begins shutdown when it sees one.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::resilience::CallError;

/// An error that ends the process with a failure status.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("token exchange failed: {0}")]
    TokenExchange(#[source] CallError),

    #[error("token refresh rejected by the accounts service: {0}")]
    RefreshRevoked(#[source] CallError),

    #[error("callback server failed: {0}")]
    CallbackServer(#[source] std::io::Error),
}

/// Sending half of the fatal error slot.
#[derive(Debug, Clone)]
pub struct FatalReporter {
    tx: mpsc::Sender<FatalError>,
}

impl FatalReporter {
    /// Report without blocking. Dropped if a report is already pending or
    /// the supervisor is gone.
    pub fn report(&self, error: FatalError) {
        match self.tx.try_send(error) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::debug!(error = %dropped, "Fatal error already pending, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                tracing::debug!(error = %dropped, "Supervisor gone, dropping fatal error");
            }
        }
    }
}

/// Create the single-slot fatal error channel.
pub fn fatal_channel() -> (FatalReporter, mpsc::Receiver<FatalError>) {
    let (tx, rx) = mpsc::channel(1);
    (FatalReporter { tx }, rx)
}
