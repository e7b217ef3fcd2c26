//! Authorization URL construction.

use rand::Rng;
use url::Url;

use super::error::AuthError;

/// GitHub's OAuth authorization endpoint.
pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// The OAuth scope requested: starring public repositories needs no more.
pub const OAUTH_SCOPE: &str = "public_repo";

/// Length of the generated anti-forgery state token.
const STATE_LEN: usize = 13;

/// Build the GitHub authorize URL for one OAuth round trip.
///
/// Pure function: the caller is responsible for storing `state` before
/// navigating. `redirect_uri` falls back to `origin` when not given.
///
/// # Errors
///
/// Returns [`AuthError::Config`] when `state` is empty.
///
/// # Example
///
/// ```
/// use starboard::auth::build_authorize_url;
///
/// let url = build_authorize_url("client123", "abc123", None, "http://localhost:3001").unwrap();
/// assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
/// assert!(url.contains("scope=public_repo"));
/// ```
pub fn build_authorize_url(
    client_id: &str,
    state: &str,
    redirect_uri: Option<&str>,
    origin: &str,
) -> Result<String, AuthError> {
    if state.is_empty() {
        return Err(AuthError::Config(
            "state token must not be empty".to_string(),
        ));
    }

    let mut url = Url::parse(AUTHORIZE_URL)
        .map_err(|e| AuthError::Config(format!("invalid authorize URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri.unwrap_or(origin))
        .append_pair("scope", OAUTH_SCOPE)
        .append_pair("state", state);

    Ok(url.into())
}

/// Generate a short random alphanumeric state token.
///
/// This is a client-side defense-in-depth check against forged callbacks,
/// not a security boundary, so a non-cryptographic source is sufficient.
#[must_use]
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..STATE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_all_parameters() {
        let url = build_authorize_url("client123", "state456", None, "http://localhost:3001")
            .expect("valid url");

        let parsed = Url::parse(&url).expect("parseable url");
        assert_eq!(parsed.host_str(), Some("github.com"));
        assert_eq!(parsed.path(), "/login/oauth/authorize");

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(pairs.contains(&("client_id".to_string(), "client123".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:3001".to_string()
        )));
        assert!(pairs.contains(&("scope".to_string(), "public_repo".to_string())));
        assert!(pairs.contains(&("state".to_string(), "state456".to_string())));
    }

    #[test]
    fn explicit_redirect_uri_overrides_origin() {
        let url = build_authorize_url(
            "client123",
            "state456",
            Some("https://app.example.com/callback"),
            "http://localhost:3001",
        )
        .expect("valid url");

        let parsed = Url::parse(&url).expect("parseable url");
        let redirect = parsed
            .query_pairs()
            .find(|(k, _)| k == "redirect_uri")
            .map(|(_, v)| v.to_string());
        assert_eq!(
            redirect,
            Some("https://app.example.com/callback".to_string())
        );
    }

    #[test]
    fn empty_state_is_rejected() {
        let err = build_authorize_url("client123", "", None, "http://localhost:3001")
            .expect_err("empty state");
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn generated_state_is_short_lowercase_alphanumeric() {
        let state = generate_state();
        assert_eq!(state.len(), 13);
        assert!(state
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn generated_states_differ() {
        // Collisions are possible in principle, just vanishingly unlikely.
        assert_ne!(generate_state(), generate_state());
    }
}
