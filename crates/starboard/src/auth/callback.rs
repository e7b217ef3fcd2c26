//! OAuth callback handling.
//!
//! The callback is modelled as a small state machine: a pure classification
//! step decides what the query parameters mean (testable without any I/O),
//! and [`CallbackHandler::handle`] drives the async consequences: token
//! exchange, identity fetch, conditional starring, and the post-success
//! redirect.
//!
//! Transition order, short-circuiting at the first applicable condition:
//!
//! 1. a processed-code marker equal to `code` keeps the handler in the
//!    loading state without doing anything;
//! 2. `code` is recorded as processed (write-before-work closes the
//!    idempotency window before the first await);
//! 3. a provider `error` parameter is a terminal error, no exchange;
//! 4. missing `code` or `state` is a terminal error;
//! 5. a stored state mismatch is a terminal error, no exchange;
//! 6. exchange, fetch identity, persist credentials, then conditionally
//!    star the pending target repository. Starring failures are logged and
//!    downgraded; they never flip a successful auth to an error.

use std::sync::Arc;
use std::time::Duration;

use url::form_urlencoded;

use super::error::AuthError;
use super::exchange::TokenExchangeClient;
use super::notice::{success_redirect_url, WARNING_NO_TARGET_REPO, WARNING_STAR_FAILED};
use crate::github::{split_full_name, GitHubClient, GitHubError, GITHUB_API_HOST};
use crate::http::HttpTransport;
use crate::session::CredentialStore;

/// Delay before the post-success redirect, so the user can read the message.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(2000);

const MSG_SUCCESS: &str = "Authentication successful! Redirecting...";
const MSG_EXCHANGE_REJECTED: &str = "Authentication failed. Please try again.";
const MSG_UNEXPECTED: &str = "An error occurred during authentication.";

/// Query parameters of the OAuth callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse the callback query string (with or without a leading `?`).
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => params.code = Some(value.to_string()),
                "state" => params.state = Some(value.to_string()),
                "error" => params.error = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }
}

/// Terminal status of one callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    /// Duplicate invocation for an already-processed code; nothing happened.
    Loading,
    Success,
    Error,
}

/// A scheduled navigation back to the application origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub url: String,
    pub after: Duration,
}

/// Result of handling one callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub status: CallbackStatus,
    pub message: String,
    pub redirect: Option<Redirect>,
}

impl CallbackOutcome {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: CallbackStatus::Error,
            message: message.into(),
            redirect: None,
        }
    }
}

/// Pure classification of callback parameters against the processed-code
/// marker. No side effects; the async handler acts on the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The marker already equals this code: a duplicate invocation.
    AlreadyProcessed,
    /// The provider reported an error; exchange must not be attempted.
    ProviderError(String),
    /// `code` or `state` is absent.
    MissingParams,
    /// Parameters are complete; proceed to state verification and exchange.
    Exchange { code: String, state: String },
}

/// Classify callback parameters.
#[must_use]
pub fn classify(params: &CallbackParams, processed_code: Option<&str>) -> Classification {
    if let (Some(code), Some(processed)) = (params.code.as_deref(), processed_code) {
        if code == processed {
            return Classification::AlreadyProcessed;
        }
    }

    if let Some(error) = &params.error {
        return Classification::ProviderError(error.clone());
    }

    match (&params.code, &params.state) {
        (Some(code), Some(state)) => Classification::Exchange {
            code: code.clone(),
            state: state.clone(),
        },
        _ => Classification::MissingParams,
    }
}

/// Drives the end-to-end callback flow.
pub struct CallbackHandler {
    store: CredentialStore,
    exchange: TokenExchangeClient,
    transport: Arc<dyn HttpTransport>,
    api_host: String,
    origin: String,
}

impl CallbackHandler {
    pub fn new(
        store: CredentialStore,
        exchange: TokenExchangeClient,
        transport: Arc<dyn HttpTransport>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            exchange,
            transport,
            api_host: GITHUB_API_HOST.to_string(),
            origin: origin.into(),
        }
    }

    /// Override the GitHub API host (used in tests).
    #[must_use]
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = host.into();
        self
    }

    /// Process one callback invocation.
    ///
    /// Idempotent per authorization code within this process: a second call
    /// with the same `code` stays in [`CallbackStatus::Loading`] and does
    /// not repeat the exchange. The marker is written before the first
    /// await, so an interleaved duplicate observes it and no-ops.
    pub async fn handle(&self, params: &CallbackParams) -> CallbackOutcome {
        match classify(params, self.store.processed_code().as_deref()) {
            Classification::AlreadyProcessed => {
                tracing::debug!("Callback already processed for this code; ignoring");
                CallbackOutcome {
                    status: CallbackStatus::Loading,
                    message: String::new(),
                    redirect: None,
                }
            }
            Classification::ProviderError(error) => {
                if let Some(code) = &params.code {
                    self.store.set_processed_code(code);
                }
                tracing::warn!("OAuth provider reported an error: {}", error);
                CallbackOutcome::error(AuthError::Provider(error).to_string())
            }
            Classification::MissingParams => {
                if let Some(code) = &params.code {
                    self.store.set_processed_code(code);
                }
                CallbackOutcome::error(AuthError::MissingParams.to_string())
            }
            Classification::Exchange { code, state } => {
                self.store.set_processed_code(&code);
                self.exchange_and_star(&code, &state).await
            }
        }
    }

    async fn exchange_and_star(&self, code: &str, state: &str) -> CallbackOutcome {
        // Anti-forgery check against the token stored before the redirect.
        match self.store.oauth_state() {
            Some(stored) if stored == state => {}
            stored => {
                tracing::warn!(
                    "OAuth state mismatch (stored: {}, returned: {})",
                    stored.is_some(),
                    state
                );
                return CallbackOutcome::error(format!(
                    "Authentication failed: {}",
                    AuthError::InvalidState
                ));
            }
        }

        let token = match self.exchange.exchange(code, state).await {
            Ok(token) => token,
            Err(AuthError::Exchange(description)) => {
                tracing::error!("Token exchange rejected: {}", description);
                return CallbackOutcome::error(MSG_EXCHANGE_REJECTED);
            }
            Err(e) => {
                tracing::error!("Token exchange failed: {}", e);
                return CallbackOutcome::error(MSG_UNEXPECTED);
            }
        };

        let client =
            GitHubClient::new_with_transport(&self.api_host, &token, Arc::clone(&self.transport));

        let user = match client.authenticated_user().await {
            Ok(user) => user,
            Err(e) => {
                let e = match e {
                    GitHubError::Api { status, message } => {
                        AuthError::IdentityFetch { status, message }
                    }
                    other => AuthError::Http(other.to_string()),
                };
                tracing::error!("{}", e);
                return CallbackOutcome::error(MSG_UNEXPECTED);
            }
        };

        self.store.set_token(&token);
        self.store.set_user(&user);
        self.store.clear_oauth_state();

        let (message, warning) = match self.store.take_target_repo() {
            Some(target) => match split_full_name(&target) {
                Some((owner, repo)) => match client.star(owner, repo).await {
                    Ok(()) => (
                        format!(
                            "Authentication successful! Repository \"{}\" has been starred. Redirecting...",
                            target
                        ),
                        None,
                    ),
                    Err(e) => {
                        tracing::error!("Failed to star {}: {}", target, e);
                        (MSG_SUCCESS.to_string(), Some(WARNING_STAR_FAILED))
                    }
                },
                None => {
                    tracing::warn!("Malformed target repository {:?}; skipping star", target);
                    (MSG_SUCCESS.to_string(), None)
                }
            },
            None => (MSG_SUCCESS.to_string(), Some(WARNING_NO_TARGET_REPO)),
        };

        CallbackOutcome {
            status: CallbackStatus::Success,
            message,
            redirect: Some(Redirect {
                url: success_redirect_url(&self.origin, warning),
                after: REDIRECT_DELAY,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_query_parses_code_state_and_error() {
        let params = CallbackParams::from_query("?code=c1&state=s1&other=x");
        assert_eq!(params.code.as_deref(), Some("c1"));
        assert_eq!(params.state.as_deref(), Some("s1"));
        assert_eq!(params.error, None);

        let params = CallbackParams::from_query("error=access_denied");
        assert_eq!(params.error.as_deref(), Some("access_denied"));
        assert_eq!(params.code, None);
    }

    #[test]
    fn classify_prefers_idempotency_guard() {
        // Even with a provider error present, an already-processed code
        // short-circuits first.
        let params = CallbackParams {
            code: Some("c1".to_string()),
            state: Some("s1".to_string()),
            error: Some("access_denied".to_string()),
        };
        assert_eq!(
            classify(&params, Some("c1")),
            Classification::AlreadyProcessed
        );
    }

    #[test]
    fn classify_reports_provider_errors_before_missing_params() {
        let params = CallbackParams {
            code: None,
            state: None,
            error: Some("access_denied".to_string()),
        };
        assert_eq!(
            classify(&params, None),
            Classification::ProviderError("access_denied".to_string())
        );
    }

    #[test]
    fn classify_requires_both_code_and_state() {
        let only_code = CallbackParams {
            code: Some("c1".to_string()),
            ..Default::default()
        };
        assert_eq!(classify(&only_code, None), Classification::MissingParams);

        let only_state = CallbackParams {
            state: Some("s1".to_string()),
            ..Default::default()
        };
        assert_eq!(classify(&only_state, None), Classification::MissingParams);

        let empty = CallbackParams::default();
        assert_eq!(classify(&empty, None), Classification::MissingParams);
    }

    #[test]
    fn classify_passes_complete_params_through() {
        let params = CallbackParams {
            code: Some("c1".to_string()),
            state: Some("s1".to_string()),
            error: None,
        };
        assert_eq!(
            classify(&params, Some("older-code")),
            Classification::Exchange {
                code: "c1".to_string(),
                state: "s1".to_string(),
            }
        );
    }
}
