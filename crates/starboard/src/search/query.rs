//! Search query construction for trending repositories.
//!
//! "Trending" is repositories created in the last seven days, ordered by
//! star count descending. The query string is assembled by hand and
//! percent-encoded as a whole, matching the shape GitHub's search endpoint
//! expects for its `q` parameter.

use chrono::{Duration, Utc};

/// Sentinel language meaning "do not filter by language".
pub const ALL_LANGUAGES: &str = "All";

/// Default number of results per page.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// One fully-resolved search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    /// Language filter; [`ALL_LANGUAGES`] disables it.
    pub language: String,
    /// Results per page.
    pub per_page: u32,
    /// Free-text search terms, already trimmed. Empty means none.
    pub search: String,
    /// Creation window start, `YYYY-MM-DD`.
    pub start: String,
    /// Creation window end, `YYYY-MM-DD`.
    pub end: String,
}

impl SearchFilter {
    /// A filter over the trailing week with no language or text filter.
    #[must_use]
    pub fn trending() -> Self {
        let (start, end) = last_week_range();
        Self {
            language: ALL_LANGUAGES.to_string(),
            per_page: DEFAULT_PER_PAGE,
            search: String::new(),
            start,
            end,
        }
    }
}

/// The `(start, end)` dates of the trailing seven days, `YYYY-MM-DD`.
#[must_use]
pub fn last_week_range() -> (String, String) {
    let today = Utc::now().date_naive();
    let week_ago = today - Duration::days(7);
    (
        week_ago.format("%Y-%m-%d").to_string(),
        today.format("%Y-%m-%d").to_string(),
    )
}

/// Build the full search URL for `filter` against `host`.
///
/// The `q` expression is `created:{start}..{end}`, then the search terms,
/// then `language:{lang}`, space-separated, and the whole expression is
/// percent-encoded once.
#[must_use]
pub fn build_search_url(host: &str, filter: &SearchFilter) -> String {
    let mut q = format!("created:{}..{}", filter.start, filter.end);
    if !filter.search.is_empty() {
        q.push(' ');
        q.push_str(&filter.search);
    }
    if filter.language != ALL_LANGUAGES {
        q.push_str(" language:");
        q.push_str(&filter.language);
    }

    format!(
        "{}/search/repositories?q={}&sort=stars&order=desc&per_page={}",
        host.trim_end_matches('/'),
        urlencoding::encode(&q),
        filter.per_page
    )
}
