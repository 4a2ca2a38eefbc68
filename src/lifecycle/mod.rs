//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (supervisor.rs):
//!     Validated config → spawn poller, callback server, authorize announcement
//!
//! Shutdown (shutdown.rs):
//!     Signal or fatal error → cancel token → drain workers (grace period) → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → clean shutdown
//!
//! Fatal errors (fatal.rs):
//!     Any worker → single slot, first wins → supervisor → failed shutdown
//! ```

pub mod fatal;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use fatal::{fatal_channel, FatalError, FatalReporter};
pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use supervisor::{RunError, Supervisor};
