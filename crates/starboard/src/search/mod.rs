//! Trending-repository search: query construction, fetching, and the
//! debounced interactive feed.

mod debounce;
mod fetch;
mod query;

pub use debounce::Debouncer;
pub use fetch::{
    FeedSnapshot, SearchClient, SearchError, SearchResults, TrendingFeed, SEARCH_DEBOUNCE,
};
pub use query::{
    build_search_url, last_week_range, SearchFilter, ALL_LANGUAGES, DEFAULT_PER_PAGE,
};
