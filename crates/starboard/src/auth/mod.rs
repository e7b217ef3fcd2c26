//! GitHub OAuth: authorization URLs, code-for-token exchange, and the
//! callback state machine.

mod authorize;
mod callback;
mod error;
mod exchange;
mod notice;

pub use authorize::{build_authorize_url, generate_state, AUTHORIZE_URL, OAUTH_SCOPE};
pub use callback::{
    classify, CallbackHandler, CallbackOutcome, CallbackParams, CallbackStatus, Classification,
    Redirect, REDIRECT_DELAY,
};
pub use error::AuthError;
pub use exchange::TokenExchangeClient;
pub use notice::{
    consume_auth_notice, error_redirect_url, success_redirect_url, AuthNotice, NoticeKind,
    WARNING_NO_TARGET_REPO, WARNING_STAR_FAILED,
};
