//! Spotify accounts service and Web API access.
//!
//! # Data Flow
//! ```text
//! TokenManager ──exchange/refresh──▶ ┐
//! PlaylistGuard ──get/update──────▶ ├─▶ SpotifyApi (one attempt) ─▶ ApiResult
//! Supervisor ──authorize──────────▶ ┘
//! ```
//!
//! # Design Decisions
//! - Every trait method performs exactly one HTTP attempt; retrying is the caller's job
//!   through `resilience::retries`
//! - HTTP 429 is surfaced as `ApiError::RateLimited` carrying the `Retry-After` delay
//! - The trait is the seam tests use to script responses

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use url::Url;

pub use client::SpotifyClient;
pub use error::{ApiError, ApiResult};
pub use types::{AccessToken, Credentials, Playlist, PlaylistUpdate, Token};

/// Scopes required to rename a playlist the user owns.
pub const PLAYLIST_SCOPES: &[&str] = &["playlist-modify-public", "playlist-modify-private"];

/// Remote operations the guard depends on.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// The authorize URL with all query parameters, built locally.
    fn authorization_url(&self, client_id: &str, redirect_uri: &str, state: &str) -> ApiResult<Url>;

    /// Fetch the authorization redirect and return the URL the user must visit.
    async fn authorize(&self, client_id: &str, redirect_uri: &str, state: &str) -> ApiResult<String>;

    /// Trade an authorization code for a token pair.
    async fn exchange_code(&self, code: &str, credentials: &Credentials) -> ApiResult<Token>;

    /// Obtain a fresh access token using a refresh token.
    async fn refresh_token(&self, refresh_token: &str, credentials: &Credentials) -> ApiResult<Token>;

    /// Read the playlist's current details.
    async fn get_playlist(&self, token: &AccessToken, playlist_id: &str) -> ApiResult<Playlist>;

    /// Change the playlist's details.
    async fn update_playlist(
        &self,
        token: &AccessToken,
        playlist_id: &str,
        update: &PlaylistUpdate,
    ) -> ApiResult<()>;
}
