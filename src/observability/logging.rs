//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Select JSON or pretty output
//! - Configure log level from config, overridable by `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

/// Directives applied when `RUST_LOG` is unset.
fn default_directives(level: &str) -> String {
    format!("playlist_guard={level},tower_http={level}")
}
