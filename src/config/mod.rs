//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → CLI flags / environment (cli.rs)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → handed to the Supervisor at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable for the life of the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::ConfigError;
pub use schema::{
    GuardConfig, ListenerConfig, OAuthConfig, ObservabilityConfig, PlaylistConfig, RetryConfig,
    SpotifyConfig, TimeoutConfig, TimingConfig,
};
