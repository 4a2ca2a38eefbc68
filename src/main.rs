//! Spotify playlist guard
//!
//! Keeps a playlist's name at the configured value, putting it back whenever
//! somebody else changes it.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                    PLAYLIST GUARD                     │
//!                      │                                                       │
//!   Browser redirect   │  ┌──────────┐   code   ┌──────────────┐               │
//!   ───────────────────┼─▶│ callback │─────────▶│    token     │◀──refresh──┐  │
//!                      │  │  server  │          │   manager    │            │  │
//!                      │  └──────────┘          └──────┬───────┘   ┌────────┴┐ │
//!                      │                               │ latest    │ refresh │ │
//!                      │                               ▼ token     │ worker  │ │
//!                      │                        ┌──────────────┐   └─────────┘ │
//!   Spotify Web API    │                        │   playlist   │               │
//!   ◀──────────────────┼────get / update────────│    guard     │               │
//!                      │                        └──────────────┘               │
//!                      │                                                       │
//!                      │  supervisor: shutdown token, fatal slot, worker drain │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use playlist_guard::config::Cli;
use playlist_guard::lifecycle::{shutdown_signal, Supervisor};
use playlist_guard::observability::{logging, metrics};
use playlist_guard::spotify::SpotifyClient;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        "playlist-guard starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = match SpotifyClient::new(&config.spotify, &config.timeouts) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create Spotify client");
            return ExitCode::FAILURE;
        }
    };

    match Supervisor::new(config, Arc::new(client)).run(shutdown_signal()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Exiting after fatal error");
            eprintln!("playlist-guard: {}", e);
            ExitCode::FAILURE
        }
    }
}
