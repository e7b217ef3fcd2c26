//! Search execution and the trending feed.
//!
//! [`SearchClient`] is the stateless fetch against GitHub's search endpoint.
//! [`TrendingFeed`] layers the interactive state on top: the current filter,
//! the debounced search text, the latest results, and the derived language
//! list. Search-text edits propagate after [`SEARCH_DEBOUNCE`] of quiet;
//! language and page-size changes refetch immediately.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::debounce::Debouncer;
use super::query::{build_search_url, SearchFilter};
use crate::github::{Repository, GITHUB_API_HOST};
use crate::http::{HttpRequest, HttpTransport, ReqwestTransport};

/// Quiet period before an edited search term triggers a fetch.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(700);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the search endpoint.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx from the search endpoint.
    #[error("GitHub API error: {status}")]
    Api { status: u16 },
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repository>,
}

/// One page of search results plus the languages seen in it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub repos: Vec<Repository>,
    /// Languages present in `repos`, sorted and deduplicated.
    pub languages: Vec<String>,
}

/// Unauthenticated client for the repository search endpoint.
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
}

impl SearchClient {
    /// Create a client against api.github.com with a reqwest transport.
    pub fn new() -> Result<Self, SearchError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| SearchError::Http(e.to_string()))?;
        Ok(Self::new_with_transport(GITHUB_API_HOST, Arc::new(transport)))
    }

    /// Create a client with an explicit host and transport (used in tests).
    pub fn new_with_transport(host: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
        }
    }

    /// Run one trending search and derive the language list from the results.
    pub async fn fetch_trending(&self, filter: &SearchFilter) -> Result<SearchResults, SearchError> {
        let url = build_search_url(&self.host, filter);
        let request = HttpRequest::get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "starboard");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        if !response.is_success() {
            return Err(SearchError::Api {
                status: response.status,
            });
        }

        let body: SearchResponse = response.decode().map_err(|e| match e {
            crate::http::HttpError::Json(e) => SearchError::Json(e),
            other => SearchError::Http(other.to_string()),
        })?;

        let languages: BTreeSet<String> = body
            .items
            .iter()
            .filter_map(|repo| repo.language.clone())
            .collect();

        Ok(SearchResults {
            repos: body.items,
            languages: languages.into_iter().collect(),
        })
    }
}

/// Observable state of the feed at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    /// Raw search text as typed, before debouncing.
    pub search: String,
    pub filter: SearchFilter,
    pub repos: Vec<Repository>,
    pub languages: Vec<String>,
    pub pending: bool,
    /// Empty when the last fetch succeeded.
    pub error: String,
}

struct FeedState {
    search: String,
    filter: SearchFilter,
    repos: Vec<Repository>,
    languages: Vec<String>,
    pending: bool,
    error: String,
    /// Bumped per fetch; a completing fetch applies its results only if it
    /// is still the latest one (last write wins).
    generation: u64,
}

struct FeedInner {
    client: SearchClient,
    state: Mutex<FeedState>,
    debouncer: Mutex<Debouncer>,
}

/// Interactive trending-repository feed.
///
/// Cheap to clone; clones share state. Language and page-size changes
/// refetch immediately, search-text edits settle through the debouncer.
#[derive(Clone)]
pub struct TrendingFeed {
    inner: Arc<FeedInner>,
}

impl TrendingFeed {
    #[must_use]
    pub fn new(client: SearchClient) -> Self {
        Self::with_debounce(client, SEARCH_DEBOUNCE)
    }

    /// Override the debounce interval (used in tests).
    #[must_use]
    pub fn with_debounce(client: SearchClient, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                client,
                state: Mutex::new(FeedState {
                    search: String::new(),
                    filter: SearchFilter::trending(),
                    repos: Vec::new(),
                    languages: Vec::new(),
                    pending: false,
                    error: String::new(),
                    generation: 0,
                }),
                debouncer: Mutex::new(Debouncer::new(debounce)),
            }),
        }
    }

    /// Current state of the feed.
    #[must_use]
    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.lock_state();
        FeedSnapshot {
            search: state.search.clone(),
            filter: state.filter.clone(),
            repos: state.repos.clone(),
            languages: state.languages.clone(),
            pending: state.pending,
            error: state.error.clone(),
        }
    }

    /// Fetch with the current filter and apply the results.
    pub async fn refresh(&self) {
        let (filter, generation) = {
            let mut state = self.lock_state();
            state.generation += 1;
            state.pending = true;
            (state.filter.clone(), state.generation)
        };

        let result = self.inner.client.fetch_trending(&filter).await;

        let mut state = self.lock_state();
        if state.generation != generation {
            // A newer fetch has been issued; drop this result.
            return;
        }
        state.pending = false;
        match result {
            Ok(results) => {
                state.repos = results.repos;
                state.languages = results.languages;
                state.error.clear();
            }
            Err(e) => {
                tracing::error!("Trending fetch failed: {}", e);
                state.repos.clear();
                let message = e.to_string();
                state.error = if message.is_empty() {
                    "Something went wrong".to_string()
                } else {
                    message
                };
            }
        }
    }

    /// Update the search text. The raw value is visible immediately; the
    /// filter updates and a fetch runs once typing goes quiet.
    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        {
            let mut state = self.lock_state();
            state.search = search.clone();
        }

        let feed = self.clone();
        let mut debouncer = match self.inner.debouncer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        debouncer.schedule(async move {
            {
                let mut state = feed.lock_state();
                state.filter.search = search.trim().to_string();
            }
            feed.refresh().await;
        });
    }

    /// Change the language filter and refetch.
    pub async fn set_language(&self, language: impl Into<String>) {
        {
            let mut state = self.lock_state();
            state.filter.language = language.into();
        }
        self.refresh().await;
    }

    /// Change the page size and refetch.
    pub async fn set_per_page(&self, per_page: u32) {
        {
            let mut state = self.lock_state();
            state.filter.per_page = per_page;
        }
        self.refresh().await;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FeedState> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse, MockTransport};
    use crate::search::query::{build_search_url, ALL_LANGUAGES};

    const HOST: &str = "https://api.test";

    fn repo_json(id: i64, full_name: &str, language: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": full_name.split('/').next_back().unwrap(),
            "full_name": full_name,
            "description": null,
            "html_url": format!("https://github.com/{full_name}"),
            "stargazers_count": 100,
            "language": language,
            "forks_count": 5,
            "owner": null
        })
    }

    fn push_results(transport: &MockTransport, filter: &SearchFilter, items: serde_json::Value) {
        transport.push_response(
            HttpMethod::Get,
            build_search_url(HOST, filter),
            HttpResponse::json(200, &serde_json::json!({ "items": items })),
        );
    }

    fn feed(transport: &MockTransport) -> TrendingFeed {
        TrendingFeed::new(SearchClient::new_with_transport(
            HOST,
            Arc::new(transport.clone()),
        ))
    }

    #[tokio::test]
    async fn refresh_populates_repos_and_languages() {
        let transport = MockTransport::new();
        let feed = feed(&transport);
        push_results(
            &transport,
            &feed.snapshot().filter,
            serde_json::json!([
                repo_json(1, "a/one", Some("Rust")),
                repo_json(2, "b/two", Some("Go")),
                repo_json(3, "c/three", Some("Rust")),
                repo_json(4, "d/four", None),
            ]),
        );

        feed.refresh().await;

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.repos.len(), 4);
        assert_eq!(snapshot.languages, vec!["Go", "Rust"]);
        assert!(snapshot.error.is_empty());
        assert!(!snapshot.pending);
    }

    #[tokio::test]
    async fn fetch_error_clears_results_and_surfaces_the_message() {
        let transport = MockTransport::new();
        let feed = feed(&transport);
        push_results(
            &transport,
            &feed.snapshot().filter,
            serde_json::json!([repo_json(1, "a/one", Some("Rust"))]),
        );
        feed.refresh().await;
        assert_eq!(feed.snapshot().repos.len(), 1);

        transport.push_response(
            HttpMethod::Get,
            build_search_url(HOST, &feed.snapshot().filter),
            HttpResponse::json(500, &serde_json::json!({"message": "boom"})),
        );
        feed.refresh().await;

        let snapshot = feed.snapshot();
        assert!(snapshot.repos.is_empty());
        assert_eq!(snapshot.error, "GitHub API error: 500");
    }

    #[tokio::test]
    async fn missing_items_field_is_an_empty_page() {
        let transport = MockTransport::new();
        let feed = feed(&transport);
        transport.push_response(
            HttpMethod::Get,
            build_search_url(HOST, &feed.snapshot().filter),
            HttpResponse::json(200, &serde_json::json!({"total_count": 0})),
        );

        feed.refresh().await;

        let snapshot = feed.snapshot();
        assert!(snapshot.repos.is_empty());
        assert!(snapshot.error.is_empty());
    }

    #[tokio::test]
    async fn set_language_refetches_immediately() {
        let transport = MockTransport::new();
        let feed = feed(&transport);

        let mut rust_filter = feed.snapshot().filter;
        rust_filter.language = "Rust".to_string();
        push_results(
            &transport,
            &rust_filter,
            serde_json::json!([repo_json(1, "a/one", Some("Rust"))]),
        );

        feed.set_language("Rust").await;

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.filter.language, "Rust");
        assert_eq!(snapshot.repos.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn search_text_settles_through_the_debouncer() {
        let transport = MockTransport::new();
        let feed = feed(&transport);

        let mut final_filter = feed.snapshot().filter.clone();
        final_filter.search = "web".to_string();
        push_results(
            &transport,
            &final_filter,
            serde_json::json!([repo_json(1, "a/one", Some("Rust"))]),
        );

        feed.set_search("w");
        feed.set_search("we");
        feed.set_search("web");

        // Raw text is visible immediately, the filter has not moved yet.
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.search, "web");
        assert_eq!(snapshot.filter.search, "");

        tokio::time::advance(SEARCH_DEBOUNCE).await;
        tokio::task::yield_now().await;
        // Give the spawned fetch a chance to complete.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.filter.search, "web");
        assert_eq!(snapshot.repos.len(), 1);
        // Only the final term hit the network.
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn default_filter_is_all_languages_twenty_per_page() {
        let transport = MockTransport::new();
        let snapshot = feed(&transport).snapshot();
        assert_eq!(snapshot.filter.language, ALL_LANGUAGES);
        assert_eq!(snapshot.filter.per_page, 20);
        assert_eq!(snapshot.filter.search, "");
    }
}
