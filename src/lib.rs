//! Spotify playlist guard library

pub mod auth;
pub mod config;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod spotify;

pub use config::schema::GuardConfig;
pub use lifecycle::{RunError, Supervisor};
pub use spotify::{SpotifyApi, SpotifyClient};
