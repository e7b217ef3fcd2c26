//! GitHub REST API client for user and star operations.
//!
//! A thin typed client over [`HttpTransport`](crate::http::HttpTransport)
//! covering the authenticated endpoints starboard needs: identity, the
//! starred-repo list, and star/unstar. Repository search is unauthenticated
//! and lives in [`crate::search`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::http::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport};
use crate::session::UserProfile;

/// Default GitHub API host.
pub const GITHUB_API_HOST: &str = "https://api.github.com";

/// Request timeout for API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum starred repos fetched in one page.
const STARRED_PAGE_SIZE: u32 = 100;

/// Errors that can occur when talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A repository full name without an owner segment.
    #[error("Invalid repository name: {0}")]
    InvalidRepoName(String),
}

/// A repository as returned by GitHub, trimmed to the fields we render.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub forks_count: u64,
    pub owner: Option<RepoOwner>,
}

/// Repository owner, trimmed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RepoOwner {
    pub login: String,
    pub avatar_url: String,
}

/// Authenticated GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    token: String,
}

impl GitHubClient {
    /// Create a client against api.github.com with a reqwest transport.
    pub fn new(token: &str) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| GitHubError::Http(e.to_string()))?;
        Ok(Self::new_with_transport(
            GITHUB_API_HOST,
            token,
            Arc::new(transport),
        ))
    }

    /// Create a client with an explicit host and transport (used in tests).
    pub fn new_with_transport(
        host: &str,
        token: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.host, path))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "starboard")
            .header("Authorization", format!("Bearer {}", self.token))
    }

    async fn send_expect_success(
        &self,
        method: HttpMethod,
        path: &str,
    ) -> Result<crate::http::HttpResponse, GitHubError> {
        let response = self
            .transport
            .send(self.request(method, path))
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        if !response.is_success() {
            return Err(GitHubError::Api {
                status: response.status,
                message: response.body_text(),
            });
        }
        Ok(response)
    }

    /// Fetch the authenticated user's profile (`GET /user`).
    pub async fn authenticated_user(&self) -> Result<UserProfile, GitHubError> {
        let response = self.send_expect_success(HttpMethod::Get, "/user").await?;
        Ok(response.decode().map_err(|e| match e {
            crate::http::HttpError::Json(e) => GitHubError::Json(e),
            other => GitHubError::Http(other.to_string()),
        })?)
    }

    /// List repositories starred by the authenticated user, one page of up
    /// to 100 (`GET /user/starred`).
    pub async fn list_starred(&self) -> Result<Vec<Repository>, GitHubError> {
        let path = format!("/user/starred?per_page={}", STARRED_PAGE_SIZE);
        let response = self.send_expect_success(HttpMethod::Get, &path).await?;
        Ok(response.decode().map_err(|e| match e {
            crate::http::HttpError::Json(e) => GitHubError::Json(e),
            other => GitHubError::Http(other.to_string()),
        })?)
    }

    /// Star a repository (`PUT /user/starred/{owner}/{repo}`).
    pub async fn star(&self, owner: &str, repo: &str) -> Result<(), GitHubError> {
        let path = format!("/user/starred/{}/{}", owner, repo);
        self.send_expect_success(HttpMethod::Put, &path).await?;
        Ok(())
    }

    /// Unstar a repository (`DELETE /user/starred/{owner}/{repo}`).
    pub async fn unstar(&self, owner: &str, repo: &str) -> Result<(), GitHubError> {
        let path = format!("/user/starred/{}/{}", owner, repo);
        self.send_expect_success(HttpMethod::Delete, &path).await?;
        Ok(())
    }
}

/// Split an "owner/name" string on the first `/` only.
///
/// Multi-segment names pass the remainder through verbatim:
/// `"org/team/project"` yields `("org", "team/project")`. Returns `None`
/// when there is no `/` at all.
#[must_use]
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let idx = full_name.find('/')?;
    Some((&full_name[..idx], &full_name[idx + 1..]))
}
