//! Command-line flags and environment overrides.

use clap::Parser;
use std::path::PathBuf;

use crate::config::loader::{finalize, read_config, ConfigError};
use crate::config::schema::GuardConfig;

/// Keep a Spotify playlist's name from being changed by anyone else.
#[derive(Debug, Parser)]
#[command(name = "playlist-guard", version, about, long_about = None)]
pub struct Cli {
    /// Optional TOML config file; flags override its values.
    #[arg(long, env = "PLAYLIST_GUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to run the callback server on.
    #[arg(long)]
    pub address: Option<String>,

    /// Port to run the callback server on.
    #[arg(long)]
    pub port: Option<u16>,

    /// ID of the playlist to protect.
    #[arg(long, env = "PLAYLIST_ID")]
    pub playlist_id: Option<String>,

    /// Expected name of the playlist being protected.
    #[arg(long, env = "PLAYLIST_NAME")]
    pub playlist_name: Option<String>,

    /// Spotify app client ID.
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// Spotify app client secret.
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Redirect URI for completing Spotify OAuth.
    #[arg(long, env = "REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Seconds between playlist checks.
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Seconds before token expiry at which to refresh.
    #[arg(long)]
    pub refresh_offset: Option<u64>,

    /// Debug logging with human-readable output.
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Build the final configuration: defaults, then the config file, then flags.
    pub fn into_config(self) -> Result<GuardConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => read_config(path)?,
            None => GuardConfig::default(),
        };
        finalize(self.apply(base))
    }

    fn apply(self, mut config: GuardConfig) -> GuardConfig {
        if self.address.is_some() || self.port.is_some() {
            let (current_host, current_port) = split_bind_address(&config.listener.bind_address);
            let host = self.address.unwrap_or(current_host);
            let port = self.port.unwrap_or(current_port);
            config.listener.bind_address = format!("{}:{}", host, port);
        }

        if let Some(id) = self.playlist_id {
            config.playlist.id = id;
        }
        if let Some(name) = self.playlist_name {
            config.playlist.name = name;
        }
        if let Some(client_id) = self.client_id {
            config.oauth.client_id = client_id;
        }
        if let Some(client_secret) = self.client_secret {
            config.oauth.client_secret = client_secret;
        }
        if let Some(redirect_uri) = self.redirect_uri {
            config.oauth.redirect_uri = redirect_uri;
        }
        if let Some(secs) = self.poll_interval {
            config.timing.poll_interval_secs = secs;
        }
        if let Some(secs) = self.refresh_offset {
            config.timing.refresh_offset_secs = secs;
        }
        if self.debug {
            config.observability.log_level = "debug".to_string();
            config.observability.json = false;
        }

        config
    }
}

fn split_bind_address(bind: &str) -> (String, u16) {
    match bind.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(8080)),
        None => (bind.to_string(), 8080),
    }
}
