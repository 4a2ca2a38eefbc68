//! Token lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! callback code
//!     → manager.rs (queued to the exchange worker, exchanged via the retry wrapper)
//!     → channel.rs (publish access token, newest wins)
//!     → refresh.rs (worker: wait expires_in - offset, refresh, republish)
//!
//! Revoked grant during refresh:
//!     → FatalReporter → Supervisor shuts everything down
//! ```
//!
//! # Design Decisions
//! - The refresh worker is the only writer of `RefreshState`; no locks around it
//! - The exchange worker alone holds the refresh worker's stop handle
//! - The latest-token channel never blocks the writer
//! - A failed first exchange is fatal; later ones keep the active token
//! - Refresh failures retry unless the grant is revoked

pub mod channel;
pub mod manager;
pub mod refresh;

use rand::distributions::Alphanumeric;
use rand::Rng;

pub use channel::{token_channel, TokenPublisher, TokenWatcher};
pub use manager::{ExchangeError, TokenManager, TokenPhase};
pub use refresh::{RefreshSchedule, RefreshState, RefreshWorker};

/// Random value for the OAuth `state` parameter.
pub fn new_oauth_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
