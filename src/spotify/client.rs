//! reqwest-backed Spotify client.
//!
//! # Responsibilities
//! - Build requests for the accounts service and the Web API
//! - Enforce connect and request timeouts on every call
//! - Classify responses into success, rate limit or permanent failure

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{redirect, Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::{SpotifyConfig, TimeoutConfig};
use crate::spotify::error::{ApiError, ApiResult};
use crate::spotify::types::{AccessToken, Credentials, Playlist, PlaylistUpdate, Token};
use crate::spotify::{SpotifyApi, PLAYLIST_SCOPES};

/// HTTP client for the accounts service and the Web API.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    /// Used for the authorize call, whose answer is the redirect itself.
    no_redirect: Client,
    accounts_url: Url,
    api_url: Url,
}

impl SpotifyClient {
    /// Create a client for the configured endpoints.
    pub fn new(spotify: &SpotifyConfig, timeouts: &TimeoutConfig) -> ApiResult<Self> {
        let accounts_url = parse_base(&spotify.accounts_url)?;
        let api_url = parse_base(&spotify.api_url)?;

        let connect = Duration::from_secs(timeouts.connect_secs);
        let request = Duration::from_secs(timeouts.request_secs);

        let http = Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .build()?;
        let no_redirect = Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .redirect(redirect::Policy::none())
            .build()?;

        tracing::debug!(
            accounts_url = %accounts_url,
            api_url = %api_url,
            connect_timeout_secs = timeouts.connect_secs,
            request_timeout_secs = timeouts.request_secs,
            "Spotify client initialized"
        );

        Ok(Self {
            http,
            no_redirect,
            accounts_url,
            api_url,
        })
    }

    fn token_url(&self) -> ApiResult<Url> {
        join(&self.accounts_url, &["api", "token"])
    }

    fn playlist_url(&self, playlist_id: &str) -> ApiResult<Url> {
        join(&self.api_url, &["playlists", playlist_id])
    }

    async fn post_token_form(&self, form: &[(&str, &str)]) -> ApiResult<Token> {
        let response = self.http.post(self.token_url()?).form(form).send().await?;
        let response = classify(response).await?;
        response
            .json::<Token>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    fn authorization_url(&self, client_id: &str, redirect_uri: &str, state: &str) -> ApiResult<Url> {
        let mut url = join(&self.accounts_url, &["authorize"])?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &PLAYLIST_SCOPES.join(" "))
            .append_pair("state", state);
        Ok(url)
    }

    async fn authorize(&self, client_id: &str, redirect_uri: &str, state: &str) -> ApiResult<String> {
        let url = self.authorization_url(client_id, redirect_uri, state)?;
        let response = classify(self.no_redirect.get(url).send().await?).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(ApiError::MissingLocation)
    }

    async fn exchange_code(&self, code: &str, credentials: &Credentials) -> ApiResult<Token> {
        self.post_token_form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &credentials.redirect_uri),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str, credentials: &Credentials) -> ApiResult<Token> {
        self.post_token_form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
        ])
        .await
    }

    async fn get_playlist(&self, token: &AccessToken, playlist_id: &str) -> ApiResult<Playlist> {
        let response = self
            .http
            .get(self.playlist_url(playlist_id)?)
            .bearer_auth(token.secret())
            .send()
            .await?;
        let response = classify(response).await?;
        response
            .json::<Playlist>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn update_playlist(
        &self,
        token: &AccessToken,
        playlist_id: &str,
        update: &PlaylistUpdate,
    ) -> ApiResult<()> {
        let response = self
            .http
            .put(self.playlist_url(playlist_id)?)
            .bearer_auth(token.secret())
            .json(update)
            .send()
            .await?;
        classify(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("accounts_url", &self.accounts_url.as_str())
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

fn parse_base(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("'{}': {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!("'{}' cannot be a base URL", raw)));
    }
    Ok(url)
}

fn join(base: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Split a response into success (2xx/3xx), rate limit (429) or failure.
async fn classify(response: Response) -> ApiResult<Response> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited {
            retry_after: retry_after(response.headers()),
        });
    }

    if status.is_success() || status.is_redirection() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), body))
}

/// `Retry-After` in whole seconds. Missing or unparseable means no extra wait.
fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn error_from_body(status: u16, body: String) -> ApiError {
    match serde_json::from_str::<OAuthErrorBody>(&body) {
        Ok(parsed) => ApiError::OAuth {
            status,
            error: parsed.error,
            description: parsed.error_description,
        },
        Err(_) => ApiError::Status { status, body },
    }
}
