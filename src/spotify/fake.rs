//! Scriptable in-memory `SpotifyApi` for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::spotify::error::{ApiError, ApiResult};
use crate::spotify::types::{AccessToken, Credentials, Playlist, PlaylistUpdate, Token};
use crate::spotify::SpotifyApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Authorize,
    Exchange { code: String },
    Refresh { refresh_token: String },
    Get { token: String },
    Update { token: String, name: String },
}

/// Scripted results are consumed first; once a script is empty the fake
/// behaves like a well-functioning remote playlist.
pub(crate) struct FakeSpotify {
    pub playlist_name: Mutex<String>,
    pub exchange_script: Mutex<VecDeque<ApiResult<Token>>>,
    pub refresh_script: Mutex<VecDeque<ApiResult<Token>>>,
    pub get_script: Mutex<VecDeque<ApiResult<Playlist>>>,
    pub update_script: Mutex<VecDeque<ApiResult<()>>>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeSpotify {
    pub fn with_name(name: &str) -> Self {
        Self {
            playlist_name: Mutex::new(name.to_string()),
            exchange_script: Mutex::new(VecDeque::new()),
            refresh_script: Mutex::new(VecDeque::new()),
            get_script: Mutex::new(VecDeque::new()),
            update_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn name(&self) -> String {
        self.playlist_name.lock().unwrap().clone()
    }

    pub fn set_name(&self, name: &str) {
        *self.playlist_name.lock().unwrap() = name.to_string();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub(crate) fn token(access: &str, refresh: Option<&str>, expires_in: Option<u64>) -> Token {
    Token {
        access_token: access.to_string(),
        token_type: "Bearer".to_string(),
        expires_in,
        refresh_token: refresh.map(str::to_string),
        scope: "playlist-modify-public playlist-modify-private".to_string(),
    }
}

pub(crate) fn rate_limited(secs: u64) -> ApiError {
    ApiError::RateLimited {
        retry_after: std::time::Duration::from_secs(secs),
    }
}

pub(crate) fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        body: "internal".to_string(),
    }
}

#[async_trait]
impl SpotifyApi for FakeSpotify {
    fn authorization_url(&self, client_id: &str, _redirect_uri: &str, state: &str) -> ApiResult<url::Url> {
        url::Url::parse_with_params(
            "https://accounts.example.com/authorize",
            &[("client_id", client_id), ("state", state)],
        )
        .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    async fn authorize(&self, _client_id: &str, _redirect_uri: &str, state: &str) -> ApiResult<String> {
        self.record(Call::Authorize);
        Ok(format!("https://accounts.example.com/login?state={}", state))
    }

    async fn exchange_code(&self, code: &str, _credentials: &Credentials) -> ApiResult<Token> {
        self.record(Call::Exchange { code: code.to_string() });
        self.exchange_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(token("access-1", Some("refresh-1"), Some(3600))))
    }

    async fn refresh_token(&self, refresh_token: &str, _credentials: &Credentials) -> ApiResult<Token> {
        self.record(Call::Refresh { refresh_token: refresh_token.to_string() });
        self.refresh_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(token("access-refreshed", None, Some(3600))))
    }

    async fn get_playlist(&self, token: &AccessToken, playlist_id: &str) -> ApiResult<Playlist> {
        self.record(Call::Get { token: token.secret().to_string() });
        let scripted = self.get_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Playlist {
                id: playlist_id.to_string(),
                name: self.name(),
            })
        })
    }

    async fn update_playlist(
        &self,
        token: &AccessToken,
        _playlist_id: &str,
        update: &PlaylistUpdate,
    ) -> ApiResult<()> {
        self.record(Call::Update {
            token: token.secret().to_string(),
            name: update.name.clone(),
        });
        let scripted = self.update_script.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            None => {
                self.set_name(&update.name);
                Ok(())
            }
        }
    }
}
