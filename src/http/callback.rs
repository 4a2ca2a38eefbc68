//! OAuth callback and status handlers.

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{ExchangeError, TokenManager, TokenPhase};

/// State injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TokenManager>,
    /// Value the authorize request carried; the callback must echo it.
    pub oauth_state: Arc<str>,
}

/// Parameters the accounts service appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    pub token_phase: TokenPhase,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
        token_phase: state.manager.phase(),
    })
}

pub async fn callback_query(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    handle_callback(state, params).await
}

pub async fn callback_form(
    State(state): State<AppState>,
    Form(params): Form<CallbackParams>,
) -> Response {
    handle_callback(state, params).await
}

async fn handle_callback(state: AppState, params: CallbackParams) -> Response {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Authorization was not granted");
        return (StatusCode::BAD_REQUEST, format!("Authorization failed: {}\n", error)).into_response();
    }

    if params.state.as_deref() != Some(&*state.oauth_state) {
        tracing::warn!("Callback state does not match the authorize request, ignoring");
        return (StatusCode::BAD_REQUEST, "State mismatch\n").into_response();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("Callback without authorization code");
        return (StatusCode::BAD_REQUEST, "Missing code\n").into_response();
    };

    tracing::info!("Authorization code received");

    match state.manager.submit_authorization_code(&code).await {
        Ok(()) => (StatusCode::OK, "Authorized, the playlist is now protected\n").into_response(),
        Err(ExchangeError::Cancelled) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Shutting down\n").into_response()
        }
        Err(e @ ExchangeError::Ignored(_)) => {
            tracing::warn!(error = %e, "Authorization code rejected, current token kept");
            (StatusCode::BAD_REQUEST, "Authorization code rejected\n").into_response()
        }
        Err(e @ ExchangeError::Rejected(_)) => {
            tracing::warn!(error = %e, "Authorization code exchange failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n").into_response()
        }
    }
}
