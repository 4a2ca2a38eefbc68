//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (authorize, exchange, refresh, get, update):
//!     → retries.rs (loop until success or permanent failure)
//!         → timeouts.rs (per-attempt deadline)
//!         → On HTTP 429: sleep Retry-After + grace, then repeat the same call
//! ```
//!
//! # Design Decisions
//! - Single retry policy for every outbound call
//! - Rate limits are retried without a ceiling; they end on their own
//! - Every other failure is permanent and goes straight back to the caller
//! - Both the attempt and the wait observe the shared cancellation token

pub mod retries;
pub mod timeouts;

pub use retries::{call_with_retry, CallError, RetryPolicy};
