//! The token-exchange relay.
//!
//! `POST /api/github-auth` swaps an authorization code for an access token
//! against GitHub's token endpoint. This is the only place the OAuth client
//! secret is used; the browser-side code only ever sees the resulting
//! access token.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use starboard::http::{HttpRequest, HttpTransport};

/// GitHub's token endpoint.
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Shared state for the relay routes.
#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn HttpTransport>,
    pub client_id: String,
    pub client_secret: String,
    /// Overridable for tests; [`GITHUB_TOKEN_URL`] in production.
    pub token_url: String,
}

/// Body of the exchange request from the frontend.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ExchangeBody {
    code: Option<String>,
    state: Option<String>,
}

/// GitHub's token response, either `{access_token}` or `{error, ...}`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/github-auth", post(exchange))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Exchange an authorization code for an access token.
pub async fn exchange(
    State(state): State<AppState>,
    Json(body): Json<ExchangeBody>,
) -> (StatusCode, Json<Value>) {
    let (Some(code), Some(oauth_state)) = (body.code, body.state) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing code or state parameter" })),
        );
    };

    tracing::info!("Exchanging code for token");

    let payload = json!({
        "client_id": state.client_id,
        "client_secret": state.client_secret,
        "code": code,
        "state": oauth_state,
    });

    let request = match HttpRequest::post_json(&state.token_url, &payload) {
        Ok(request) => request.header("Accept", "application/json"),
        Err(e) => {
            tracing::error!("Failed to build token request: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to exchange code for token" })),
            );
        }
    };

    let response = match state.transport.send(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("GitHub OAuth error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to exchange code for token" })),
            );
        }
    };

    let token: TokenResponse = match response.decode() {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("GitHub OAuth error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to exchange code for token" })),
            );
        }
    };

    if let Some(error) = token.error {
        let description = token.error_description.unwrap_or(error);
        tracing::warn!("Token exchange rejected: {}", description);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": description })),
        );
    }

    let Some(access_token) = token.access_token.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No access token received" })),
        );
    };

    (StatusCode::OK, Json(json!({ "access_token": access_token })))
}
