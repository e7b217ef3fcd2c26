//! Post-auth redirect parameters: producing and consuming.
//!
//! After the OAuth round trip the browser lands back on the application
//! origin with the result encoded in the query string: `success=true` with
//! an optional `warning`, or `error={message}`. The UI reads these exactly
//! once and then strips them (the history-replacement analogue), so a
//! reload does not re-trigger the message.

use url::form_urlencoded;

/// Starring the pending repository failed after a successful sign-in.
pub const WARNING_STAR_FAILED: &str = "STAR_FAILED";

/// No target repository was pending when the sign-in completed.
pub const WARNING_NO_TARGET_REPO: &str = "NO_TARGET_REPO";

/// Whether a notice reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A humanized, display-ready auth result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthNotice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Build the post-success redirect URL for the application origin.
#[must_use]
pub fn success_redirect_url(origin: &str, warning: Option<&str>) -> String {
    let origin = origin.trim_end_matches('/');
    match warning {
        Some(warning) => format!("{}?success=true&warning={}", origin, warning),
        None => format!("{}?success=true", origin),
    }
}

/// Build the post-failure redirect URL for the application origin.
#[must_use]
pub fn error_redirect_url(origin: &str, message: &str) -> String {
    format!(
        "{}?error={}",
        origin.trim_end_matches('/'),
        urlencoding::encode(message)
    )
}

/// Read the auth-result parameters out of a query string.
///
/// Returns the humanized notice (if any) together with the query string
/// with the `success`/`warning`/`error` parameters removed; all other
/// parameters pass through untouched. Re-parsing the stripped query yields
/// no notice.
#[must_use]
pub fn consume_auth_notice(query: &str) -> (Option<AuthNotice>, String) {
    let query = query.trim_start_matches('?');

    let mut success = false;
    let mut warning: Option<String> = None;
    let mut error: Option<String> = None;
    let mut remainder = form_urlencoded::Serializer::new(String::new());

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "success" => success = value == "true",
            "warning" => warning = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            _ => {
                remainder.append_pair(&key, &value);
            }
        }
    }

    let notice = if let Some(message) = error {
        Some(AuthNotice {
            kind: NoticeKind::Error,
            message,
        })
    } else if success {
        let message = match warning.as_deref() {
            Some(WARNING_STAR_FAILED) => {
                "Signed in with GitHub, but starring the repository failed.".to_string()
            }
            Some(WARNING_NO_TARGET_REPO) => {
                "Signed in with GitHub. No repository was selected to star.".to_string()
            }
            Some(other) => format!("Signed in with GitHub. ({})", other),
            None => "Successfully signed in with GitHub.".to_string(),
        };
        Some(AuthNotice {
            kind: NoticeKind::Success,
            message,
        })
    } else {
        None
    };

    (notice, remainder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_url_with_and_without_warning() {
        assert_eq!(
            success_redirect_url("http://localhost:3001", None),
            "http://localhost:3001?success=true"
        );
        assert_eq!(
            success_redirect_url("http://localhost:3001/", Some(WARNING_STAR_FAILED)),
            "http://localhost:3001?success=true&warning=STAR_FAILED"
        );
    }

    #[test]
    fn error_url_encodes_message() {
        assert_eq!(
            error_redirect_url("http://localhost:3001", "bad code & state"),
            "http://localhost:3001?error=bad%20code%20%26%20state"
        );
    }

    #[test]
    fn plain_success_is_humanized() {
        let (notice, stripped) = consume_auth_notice("?success=true");
        let notice = notice.expect("notice present");
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, "Successfully signed in with GitHub.");
        assert_eq!(stripped, "");
    }

    #[test]
    fn warnings_are_humanized() {
        let (notice, _) = consume_auth_notice("success=true&warning=STAR_FAILED");
        assert_eq!(
            notice.expect("notice").message,
            "Signed in with GitHub, but starring the repository failed."
        );

        let (notice, _) = consume_auth_notice("success=true&warning=NO_TARGET_REPO");
        assert_eq!(
            notice.expect("notice").message,
            "Signed in with GitHub. No repository was selected to star."
        );
    }

    #[test]
    fn error_parameter_is_decoded_and_wins() {
        let (notice, stripped) =
            consume_auth_notice("error=Token%20exchange%20failed&success=true");
        let notice = notice.expect("notice");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Token exchange failed");
        assert_eq!(stripped, "");
    }

    #[test]
    fn unrelated_parameters_survive_stripping() {
        let (notice, stripped) = consume_auth_notice("tab=trending&success=true&page=2");
        assert!(notice.is_some());
        assert_eq!(stripped, "tab=trending&page=2");
    }

    #[test]
    fn stripped_query_yields_no_notice_on_reparse() {
        let (_, stripped) = consume_auth_notice("success=true&warning=STAR_FAILED&tab=x");
        let (notice, _) = consume_auth_notice(&stripped);
        assert!(notice.is_none());
    }

    #[test]
    fn empty_query_has_no_notice() {
        let (notice, stripped) = consume_auth_notice("");
        assert!(notice.is_none());
        assert_eq!(stripped, "");
    }
}
