//! Inbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Browser redirect from the accounts service
//!     → server.rs (Axum setup, tracing, timeout)
//!     → callback.rs (check state, extract code)
//!     → TokenManager::submit_authorization_code
//! ```

pub mod callback;
pub mod server;

pub use callback::{AppState, CallbackParams};
pub use server::{CallbackServer, CALLBACK_PATH, STATUS_PATH};
