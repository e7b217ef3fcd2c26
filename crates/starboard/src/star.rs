//! Optimistic star/unstar with rollback.
//!
//! The coordinator owns the in-memory starred set and flips it before the
//! network call so the UI reacts instantly. On failure it restores the
//! snapshot captured at mutation time. A per-repository loading marker
//! guards against double toggles while a call is in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::github::{split_full_name, GitHubClient, GitHubError};
use crate::http::HttpTransport;
use crate::session::CredentialStore;

/// What one toggle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Not signed in. The repository was remembered as the pending target;
    /// `prompt` says whether the caller should open the login modal now.
    LoginRequired { prompt: bool },
    /// A toggle for this repository is already in flight; nothing happened.
    Busy,
    Starred,
    Unstarred,
    /// The provider call failed and the optimistic flip was undone.
    RolledBack,
}

/// Coordinates starring against the signed-in user's starred set.
pub struct StarCoordinator {
    store: CredentialStore,
    transport: Arc<dyn HttpTransport>,
    api_host: String,
    starred: Mutex<HashSet<String>>,
    loading: Mutex<HashSet<String>>,
}

impl StarCoordinator {
    pub fn new(
        store: CredentialStore,
        transport: Arc<dyn HttpTransport>,
        api_host: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            api_host: api_host.into(),
            starred: Mutex::new(HashSet::new()),
            loading: Mutex::new(HashSet::new()),
        }
    }

    /// Whether the signed-in user has `full_name` starred, per local state.
    #[must_use]
    pub fn is_starred(&self, full_name: &str) -> bool {
        lock(&self.starred).contains(full_name)
    }

    /// Whether a toggle for `full_name` is currently in flight.
    #[must_use]
    pub fn is_loading(&self, full_name: &str) -> bool {
        lock(&self.loading).contains(full_name)
    }

    /// Snapshot of the starred set.
    #[must_use]
    pub fn starred(&self) -> HashSet<String> {
        lock(&self.starred).clone()
    }

    /// Reconcile the starred set against the provider.
    ///
    /// Signed out, the set is simply cleared with no fetch. Fetch failures
    /// are logged and leave the current set in place.
    pub async fn refresh_starred(&self) {
        let Some(token) = self.store.token() else {
            lock(&self.starred).clear();
            return;
        };

        let client = self.client(&token);
        match client.list_starred().await {
            Ok(repos) => {
                let names = repos.into_iter().map(|r| r.full_name).collect();
                *lock(&self.starred) = names;
            }
            Err(e) => {
                tracing::error!("Failed to refresh starred repos: {}", e);
            }
        }
    }

    /// Toggle the star on `full_name`, optimistically.
    ///
    /// Unauthenticated callers get [`ToggleOutcome::LoginRequired`] and the
    /// repository is stored as the pending target for the post-auth star;
    /// `login_modal_open` suppresses the prompt when the modal is already
    /// showing. The optimistic flip happens before the network call and is
    /// rolled back to the captured snapshot if the call fails.
    pub async fn toggle_star(&self, full_name: &str, login_modal_open: bool) -> ToggleOutcome {
        let Some(token) = self.store.token() else {
            self.store.set_target_repo(full_name);
            return ToggleOutcome::LoginRequired {
                prompt: !login_modal_open,
            };
        };

        {
            let mut loading = lock(&self.loading);
            if !loading.insert(full_name.to_string()) {
                return ToggleOutcome::Busy;
            }
        }

        let (snapshot, starring) = {
            let mut starred = lock(&self.starred);
            let snapshot = starred.clone();
            let starring = !starred.contains(full_name);
            if starring {
                starred.insert(full_name.to_string());
            } else {
                starred.remove(full_name);
            }
            (snapshot, starring)
        };

        let result = self.send_toggle(&token, full_name, starring).await;

        lock(&self.loading).remove(full_name);

        match result {
            Ok(()) => {
                if starring {
                    ToggleOutcome::Starred
                } else {
                    ToggleOutcome::Unstarred
                }
            }
            Err(e) => {
                tracing::error!(
                    "Failed to {} {}: {}",
                    if starring { "star" } else { "unstar" },
                    full_name,
                    e
                );
                *lock(&self.starred) = snapshot;
                ToggleOutcome::RolledBack
            }
        }
    }

    async fn send_toggle(
        &self,
        token: &str,
        full_name: &str,
        starring: bool,
    ) -> Result<(), GitHubError> {
        let (owner, repo) = split_full_name(full_name)
            .ok_or_else(|| GitHubError::InvalidRepoName(full_name.to_string()))?;

        let client = self.client(token);
        if starring {
            client.star(owner, repo).await
        } else {
            client.unstar(owner, repo).await
        }
    }

    // Built per call so a token change (login/logout) needs no reset hook.
    fn client(&self, token: &str) -> GitHubClient {
        GitHubClient::new_with_transport(&self.api_host, token, Arc::clone(&self.transport))
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
