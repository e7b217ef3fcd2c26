//! Starboard - trending GitHub repositories with one-click starring.
//!
//! This library implements the client-side flow behind the starboard app:
//! GitHub OAuth (authorization URL, code-for-token exchange through the
//! same-origin relay, and the callback state machine), a debounced trending
//! search, and optimistic star/unstar with rollback. The companion server
//! crate hosts the relay endpoint that keeps the client secret off the
//! client.
//!
//! # Example
//!
//! ```ignore
//! use starboard::auth::{build_authorize_url, generate_state};
//! use starboard::session::CredentialStore;
//!
//! let store = CredentialStore::in_memory();
//! let state = generate_state();
//! store.set_oauth_state(&state);
//!
//! let url = build_authorize_url(client_id, &state, None, origin)?;
//! // Navigate the user to `url`; the callback handler takes it from there.
//! ```

pub mod auth;
pub mod github;
pub mod http;
pub mod search;
pub mod session;
pub mod star;

pub use github::{GitHubClient, GitHubError, Repository};
pub use session::{AuthState, CredentialStore, UserProfile};
pub use star::{StarCoordinator, ToggleOutcome};
