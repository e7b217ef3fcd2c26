//! Code-for-token exchange against the same-origin relay.
//!
//! The browser-side flow never talks to GitHub's token endpoint directly:
//! the relay (see the server crate) holds the client secret. This client
//! posts `{code, state}` to the relay and interprets its response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::http::{HttpRequest, HttpTransport};

/// Request body sent to the relay.
#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    code: &'a str,
    state: &'a str,
}

/// Relay response: `{access_token}` on success, `{error}` otherwise.
#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Client for the relay's token-exchange endpoint.
#[derive(Clone)]
pub struct TokenExchangeClient {
    transport: Arc<dyn HttpTransport>,
    relay_url: String,
}

impl TokenExchangeClient {
    /// `relay_url` is the full URL of the relay endpoint, e.g.
    /// `http://localhost:3001/api/github-auth`.
    pub fn new(transport: Arc<dyn HttpTransport>, relay_url: impl Into<String>) -> Self {
        Self {
            transport,
            relay_url: relay_url.into(),
        }
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// [`AuthError::Exchange`] carries the relay's error description when the
    /// relay rejects the code; transport failures map to [`AuthError::Http`].
    pub async fn exchange(&self, code: &str, state: &str) -> Result<String, AuthError> {
        let request = HttpRequest::post_json(&self.relay_url, &ExchangeRequest { code, state })?
            .header("Accept", "application/json");

        let response = self.transport.send(request).await?;

        // The relay reports failures as {error} with a non-2xx status; keep
        // the description when it parses, fall back to the raw status.
        let body: ExchangeResponse = match response.decode() {
            Ok(body) => body,
            Err(_) if !response.is_success() => {
                return Err(AuthError::Exchange(format!(
                    "relay returned status {}",
                    response.status
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if !response.is_success() {
            let description = body
                .error
                .unwrap_or_else(|| format!("relay returned status {}", response.status));
            return Err(AuthError::Exchange(description));
        }

        if let Some(error) = body.error {
            return Err(AuthError::Exchange(error));
        }

        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Exchange("No access token received".to_string()))
    }
}
