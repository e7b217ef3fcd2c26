//! Error types for the OAuth flow.

use thiserror::Error;

/// Errors that can occur while authenticating.
///
/// Protocol-level failures (invalid state, missing parameters, a
/// provider-reported error) are terminal for the callback and surfaced to
/// the user. Exchange and identity-fetch failures are terminal with a
/// generic user-facing message; the detail is logged, not shown.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The returned `state` did not match the stored anti-forgery token.
    #[error("Invalid state parameter")]
    InvalidState,

    /// The callback was missing its `code` or `state` parameter.
    #[error("Missing authorization code or state parameter")]
    MissingParams,

    /// The OAuth provider reported an error in the callback.
    #[error("Authentication failed: {0}")]
    Provider(String),

    /// The relay endpoint rejected the code-for-token exchange.
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// Fetching the authenticated user's identity failed.
    #[error("Identity fetch failed ({status}): {message}")]
    IdentityFetch { status: u16, message: String },

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration (empty state token, bad URL, ...).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<crate::http::HttpError> for AuthError {
    fn from(err: crate::http::HttpError) -> Self {
        match err {
            crate::http::HttpError::Json(e) => AuthError::Json(e),
            other => AuthError::Http(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            AuthError::InvalidState.to_string(),
            "Invalid state parameter"
        );
        assert_eq!(
            AuthError::MissingParams.to_string(),
            "Missing authorization code or state parameter"
        );
        assert_eq!(
            AuthError::Provider("access_denied".to_string()).to_string(),
            "Authentication failed: access_denied"
        );
        assert_eq!(
            AuthError::Exchange("bad_verification_code".to_string()).to_string(),
            "Token exchange failed: bad_verification_code"
        );
        assert_eq!(
            AuthError::IdentityFetch {
                status: 401,
                message: "Bad credentials".to_string(),
            }
            .to_string(),
            "Identity fetch failed (401): Bad credentials"
        );
    }

    #[test]
    fn http_error_converts_to_transport_variant() {
        let err: AuthError = crate::http::HttpError::Transport("refused".to_string()).into();
        assert!(matches!(err, AuthError::Http(_)));
    }
}
