//! Shared helpers for integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use playlist_guard::config::{GuardConfig, SpotifyConfig};

pub const PLAYLIST_ID: &str = "37i9dQZF1DX";
pub const DESIRED_NAME: &str = "My Mix";

/// Endpoints pointing at the mock server.
pub fn spotify_config(server: &MockServer) -> SpotifyConfig {
    SpotifyConfig {
        accounts_url: server.uri(),
        api_url: format!("{}/v1", server.uri()),
    }
}

/// A complete config against the mock server, polling every second.
pub fn guard_config(server: &MockServer) -> GuardConfig {
    let mut config = GuardConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.playlist.id = PLAYLIST_ID.into();
    config.playlist.name = DESIRED_NAME.into();
    config.oauth.client_id = "client-id".into();
    config.oauth.client_secret = "client-secret".into();
    config.oauth.redirect_uri = "http://127.0.0.1/spotify/callback".into();
    config.spotify = spotify_config(server);
    config.timing.poll_interval_secs = 1;
    config.timing.shutdown_grace_secs = 2;
    config.retries.rate_limit_grace_ms = 100;
    config
}

pub fn token_body(access: &str, refresh: Option<&str>, expires_in: u64) -> Value {
    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "scope": "playlist-modify-public playlist-modify-private",
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

/// Answer authorization code exchanges with `body`.
pub async fn mount_exchange(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer refresh requests with `body`.
pub async fn mount_refresh(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_authorize(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/authorize"))
        .respond_with(
            ResponseTemplate::new(303)
                .insert_header("Location", "https://accounts.example.com/login?continue=abc"),
        )
        .mount(server)
        .await;
}

pub fn playlist_path() -> String {
    format!("/v1/playlists/{}", PLAYLIST_ID)
}

pub fn playlist_body(name: &str) -> Value {
    json!({ "id": PLAYLIST_ID, "name": name, "public": true })
}

/// A loopback listener on a free port.
pub async fn listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Deliver the OAuth redirect the way a browser would.
pub async fn send_callback(addr: SocketAddr, code: &str, state: &str) -> reqwest::StatusCode {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();
    client
        .get(format!("http://{}/spotify/callback", addr))
        .query(&[("code", code), ("state", state)])
        .send()
        .await
        .expect("callback server unreachable")
        .status()
}

/// Requests the mock server received for `path` with `method`.
pub async fn received(server: &MockServer, http_method: &str, request_path: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
        .collect()
}
