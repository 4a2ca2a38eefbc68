//! Callback server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the callback and status handlers
//! - Wire up middleware (tracing, request timeout)
//! - Serve until cancelled

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::TokenManager;
use crate::config::TimeoutConfig;
use crate::http::callback::{self, AppState};

pub const CALLBACK_PATH: &str = "/spotify/callback";
pub const STATUS_PATH: &str = "/status";

/// HTTP server receiving the OAuth redirect.
pub struct CallbackServer {
    router: Router,
}

impl CallbackServer {
    pub fn new(manager: Arc<TokenManager>, oauth_state: &str, timeouts: &TimeoutConfig) -> Self {
        let state = AppState {
            manager,
            oauth_state: Arc::from(oauth_state),
        };
        Self {
            router: Self::build_router(state, Duration::from_secs(timeouts.callback_secs)),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, timeout: Duration) -> Router {
        Router::new()
            .route(STATUS_PATH, get(callback::status))
            .route(
                CALLBACK_PATH,
                get(callback::callback_query).post(callback::callback_form),
            )
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `cancel` fires.
    pub async fn run(self, listener: TcpListener, cancel: CancellationToken) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Callback server ready");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("Callback server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{token_channel, RefreshSchedule, TokenPhase, TokenWatcher};
    use crate::lifecycle::{fatal_channel, FatalError, Shutdown};
    use crate::resilience::RetryPolicy;
    use crate::spotify::fake::{rate_limited, server_error, token, Call, FakeSpotify};
    use crate::spotify::{ApiError, Credentials};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    struct Harness {
        api: Arc<FakeSpotify>,
        router: Router,
        watcher: TokenWatcher,
        fatal_rx: mpsc::Receiver<FatalError>,
        shutdown: Shutdown,
    }

    fn harness(api: FakeSpotify) -> Harness {
        let api = Arc::new(api);
        let (publisher, watcher) = token_channel();
        let (fatal, fatal_rx) = fatal_channel();
        let shutdown = Shutdown::new();
        let manager = Arc::new(TokenManager::new(
            api.clone(),
            Credentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
                redirect_uri: "http://localhost/cb".into(),
            },
            RefreshSchedule {
                offset: Duration::from_secs(60),
                retry_delay: Duration::from_secs(1),
            },
            RetryPolicy::default(),
            publisher,
            fatal,
            shutdown.clone(),
        ));
        let server = CallbackServer::new(manager, "st4te", &TimeoutConfig::default());
        Harness {
            api,
            router: server.router(),
            watcher,
            fatal_rx,
            shutdown,
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_status_reports_token_phase() {
        let h = harness(FakeSpotify::with_name("x"));

        let response = h.router.clone().oneshot(get("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["token_phase"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_callback_exchanges_code() {
        let mut h = harness(FakeSpotify::with_name("x"));

        let response = h
            .router
            .clone()
            .oneshot(get("/spotify/callback?code=abc&state=st4te"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.api.calls(), vec![Call::Exchange { code: "abc".into() }]);
        assert!(h.watcher.latest().is_some());

        let response = h.router.clone().oneshot(get("/status")).await.unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["token_phase"], serde_json::json!(TokenPhase::Active));

        h.shutdown.trigger();
        h.shutdown.drain(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_callback_accepts_form_post() {
        let h = harness(FakeSpotify::with_name("x"));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/spotify/callback")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("code=xyz&state=st4te"))
            .unwrap();
        let response = h.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.api.calls(), vec![Call::Exchange { code: "xyz".into() }]);

        h.shutdown.trigger();
        h.shutdown.drain(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_callback_rejects_bad_requests() {
        let h = harness(FakeSpotify::with_name("x"));

        for uri in [
            "/spotify/callback?state=st4te",
            "/spotify/callback?code=abc",
            "/spotify/callback?code=abc&state=other",
            "/spotify/callback?error=access_denied&state=st4te",
        ] {
            let response = h.router.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exchange_failure_returns_500_and_is_fatal() {
        let api = FakeSpotify::with_name("x");
        api.exchange_script.lock().unwrap().push_back(Err(server_error()));
        let mut h = harness(api);

        let response = h
            .router
            .clone()
            .oneshot(get("/spotify/callback?code=abc&state=st4te"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(h.fatal_rx.try_recv(), Ok(FatalError::TokenExchange(_))));
    }

    async fn token_phase(router: &Router) -> serde_json::Value {
        let response = router.clone().oneshot(get("/status")).await.unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        body["token_phase"].clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exchange_continues_after_request_timeout() {
        let api = FakeSpotify::with_name("x");
        api.exchange_script.lock().unwrap().push_back(Err(rate_limited(600)));
        let mut h = harness(api);

        let response = h
            .router
            .clone()
            .oneshot(get("/spotify/callback?code=abc&state=st4te"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(token_phase(&h.router).await, "exchanging");

        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(token_phase(&h.router).await, "active");
        assert_eq!(h.watcher.latest().unwrap().secret(), "access-1");
        assert_eq!(h.api.calls().len(), 2);
        assert!(h.fatal_rx.try_recv().is_err());

        h.shutdown.trigger();
        assert!(h.shutdown.drain(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_replayed_callback_keeps_token() {
        let api = FakeSpotify::with_name("x");
        {
            let mut script = api.exchange_script.lock().unwrap();
            script.push_back(Ok(token("access-1", Some("refresh-1"), Some(3600))));
            script.push_back(Err(ApiError::OAuth {
                status: 400,
                error: "invalid_grant".into(),
                description: Some("Invalid authorization code".into()),
            }));
        }
        let mut h = harness(api);

        let first = h
            .router
            .clone()
            .oneshot(get("/spotify/callback?code=abc&state=st4te"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let replayed = h
            .router
            .clone()
            .oneshot(get("/spotify/callback?code=abc&state=st4te"))
            .await
            .unwrap();
        assert_eq!(replayed.status(), StatusCode::BAD_REQUEST);

        assert!(h.fatal_rx.try_recv().is_err());
        assert_eq!(token_phase(&h.router).await, "active");
        assert_eq!(h.watcher.latest().unwrap().secret(), "access-1");

        h.shutdown.trigger();
        h.shutdown.drain(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let h = harness(FakeSpotify::with_name("x"));
        let server = CallbackServer { router: h.router };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(server.run(listener, cancel.clone()));
        cancel.cancel();

        handle.await.unwrap().unwrap();
    }
}
