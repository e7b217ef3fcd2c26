//! Session-scoped credential storage.
//!
//! All OAuth-related state (anti-forgery state token, access token, user
//! profile, pending target repository, processed-code marker) lives behind
//! [`CredentialStore`], the single writer for session data. The storage
//! backend is a [`SessionStore`] trait so the in-memory implementation used
//! here can be swapped for a persistent one without touching callers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Storage keys. These are a stable contract: changing one invalidates
/// credentials stored under the old name.
pub mod keys {
    /// Anti-forgery state token for the in-flight OAuth round trip.
    pub const OAUTH_STATE: &str = "github_oauth_state";
    /// OAuth access token.
    pub const ACCESS_TOKEN: &str = "github_access_token";
    /// Authenticated user profile, JSON-encoded.
    pub const USER: &str = "github_user";
    /// Pending target repository ("owner/name") to star after auth.
    pub const TARGET_REPO: &str = "github_target_repo";
    /// Most recently processed authorization code (idempotency guard).
    pub const PROCESSED_CODE: &str = "processed_oauth_code";
}

/// Key/value storage with a session lifetime.
pub trait SessionStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
}

/// In-memory [`SessionStore`]. Dropped with the process, like browser
/// session storage is dropped with the tab.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .expect("session store lock should not be poisoned")
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .expect("session store lock should not be poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner
            .lock()
            .expect("session store lock should not be poisoned")
            .remove(key);
    }

    fn clear(&self) {
        self.inner
            .lock()
            .expect("session store lock should not be poisoned")
            .clear();
    }
}

/// The authenticated user's profile. Replaced wholesale on re-authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
}

/// Derived authentication state.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
    pub token: Option<String>,
}

/// Typed accessors over a [`SessionStore`].
///
/// Cloning is cheap; clones share the same underlying storage.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn SessionStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// A store backed by fresh in-memory session storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn set_token(&self, token: &str) {
        self.store.write(keys::ACCESS_TOKEN, token);
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.read(keys::ACCESS_TOKEN)
    }

    pub fn set_user(&self, user: &UserProfile) {
        match serde_json::to_string(user) {
            Ok(json) => self.store.write(keys::USER, &json),
            Err(e) => tracing::error!("Failed to encode user profile: {}", e),
        }
    }

    /// The stored user profile.
    ///
    /// Fails soft: stored data that does not decode is logged and treated as
    /// "no user" rather than surfaced to the caller.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        let json = self.store.read(keys::USER)?;
        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!("Failed to decode stored user profile: {}", e);
                None
            }
        }
    }

    pub fn set_oauth_state(&self, state: &str) {
        self.store.write(keys::OAUTH_STATE, state);
    }

    #[must_use]
    pub fn oauth_state(&self) -> Option<String> {
        self.store.read(keys::OAUTH_STATE)
    }

    pub fn clear_oauth_state(&self) {
        self.store.remove(keys::OAUTH_STATE);
    }

    pub fn set_target_repo(&self, full_name: &str) {
        self.store.write(keys::TARGET_REPO, full_name);
    }

    #[must_use]
    pub fn target_repo(&self) -> Option<String> {
        self.store.read(keys::TARGET_REPO)
    }

    pub fn clear_target_repo(&self) {
        self.store.remove(keys::TARGET_REPO);
    }

    /// Read the pending target repository and clear the marker.
    #[must_use]
    pub fn take_target_repo(&self) -> Option<String> {
        let target = self.target_repo();
        if target.is_some() {
            self.clear_target_repo();
        }
        target
    }

    pub fn set_processed_code(&self, code: &str) {
        self.store.write(keys::PROCESSED_CODE, code);
    }

    #[must_use]
    pub fn processed_code(&self) -> Option<String> {
        self.store.read(keys::PROCESSED_CODE)
    }

    /// Derive the current authentication state by re-reading storage.
    ///
    /// Never cached, so it is always consistent with what the store holds:
    /// authenticated iff both a non-empty token and a decodable user are
    /// present.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        let token = self.token().filter(|t| !t.is_empty());
        let user = self.user();
        AuthState {
            is_authenticated: token.is_some() && user.is_some(),
            user,
            token,
        }
    }

    /// Clear token, user, state token and target-repo marker.
    pub fn logout(&self) {
        self.store.remove(keys::ACCESS_TOKEN);
        self.store.remove(keys::USER);
        self.store.remove(keys::OAUTH_STATE);
        self.store.remove(keys::TARGET_REPO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            avatar_url: "https://avatars.githubusercontent.com/u/1".to_string(),
        }
    }

    #[test]
    fn token_round_trips() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.token(), None);

        store.set_token("gho_abc");
        assert_eq!(store.token(), Some("gho_abc".to_string()));
    }

    #[test]
    fn user_round_trips() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.user(), None);

        store.set_user(&profile());
        assert_eq!(store.user(), Some(profile()));
    }

    #[test]
    fn user_fails_soft_on_corrupt_data() {
        let backing = Arc::new(MemoryStore::new());
        backing.write(keys::USER, "not json");

        let store = CredentialStore::new(backing);
        assert_eq!(store.user(), None);
    }

    #[test]
    fn auth_state_requires_both_token_and_user() {
        let store = CredentialStore::in_memory();
        assert!(!store.auth_state().is_authenticated);

        store.set_token("gho_abc");
        assert!(!store.auth_state().is_authenticated);

        store.set_user(&profile());
        let state = store.auth_state();
        assert!(state.is_authenticated);
        assert_eq!(state.token, Some("gho_abc".to_string()));
        assert_eq!(state.user, Some(profile()));
    }

    #[test]
    fn auth_state_treats_empty_token_as_absent() {
        let store = CredentialStore::in_memory();
        store.set_token("");
        store.set_user(&profile());
        assert!(!store.auth_state().is_authenticated);
    }

    #[test]
    fn auth_state_is_recomputed_not_cached() {
        let store = CredentialStore::in_memory();
        store.set_token("gho_abc");
        store.set_user(&profile());
        assert!(store.auth_state().is_authenticated);

        store.logout();
        assert!(!store.auth_state().is_authenticated);
    }

    #[test]
    fn take_target_repo_reads_once() {
        let store = CredentialStore::in_memory();
        store.set_target_repo("facebook/react");

        assert_eq!(store.take_target_repo(), Some("facebook/react".to_string()));
        assert_eq!(store.take_target_repo(), None);
    }

    #[test]
    fn logout_clears_credentials_and_markers() {
        let store = CredentialStore::in_memory();
        store.set_token("gho_abc");
        store.set_user(&profile());
        store.set_oauth_state("s1");
        store.set_target_repo("facebook/react");
        store.set_processed_code("c1");

        store.logout();

        assert_eq!(store.token(), None);
        assert_eq!(store.user(), None);
        assert_eq!(store.oauth_state(), None);
        assert_eq!(store.target_repo(), None);
        // The processed-code marker survives logout so a stale callback
        // cannot be replayed after signing out.
        assert_eq!(store.processed_code(), Some("c1".to_string()));
    }
}
