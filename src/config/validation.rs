//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required values present (playlist, OAuth client)
//! - Addresses and URLs parse, intervals are positive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GuardConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is not a valid address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check everything the guard needs before it starts.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required = [
        ("playlist.id", &config.playlist.id),
        ("playlist.name", &config.playlist.name),
        ("oauth.client_id", &config.oauth.client_id),
        ("oauth.client_secret", &config.oauth.client_secret),
        ("oauth.redirect_uri", &config.oauth.redirect_uri),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::Missing(field));
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if !config.oauth.redirect_uri.trim().is_empty() {
        check_url(&mut errors, "oauth.redirect_uri", &config.oauth.redirect_uri);
    }
    check_url(&mut errors, "spotify.accounts_url", &config.spotify.accounts_url);
    check_url(&mut errors, "spotify.api_url", &config.spotify.api_url);

    let positive = [
        ("timing.poll_interval_secs", config.timing.poll_interval_secs),
        ("timing.refresh_retry_secs", config.timing.refresh_retry_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.callback_secs", config.timeouts.callback_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
