//! GitHub REST API client for token validation, repository browsing and
//! pull request review actions.
//!
//! Tokens are per account, so every call takes the caller's personal access
//! token rather than baking one into the client.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::DEFAULT_GITHUB_API_URL;
use crate::error::{BridgeError, Result};
use crate::jira_key::extract_jira_key_from_pull;
use crate::models::{GitHubUser, PullSummary, RepoPermissions, RepoSummary};

/// Default page size for `GET /user/repos`.
pub const DEFAULT_REPOS_PER_PAGE: u32 = 10;

/// GitHub API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
}

/// How GitHub should merge a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    #[default]
    Merge,
    Squash,
    Rebase,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    id: u64,
    name: String,
    full_name: String,
    #[serde(default)]
    owner: Option<RawOwner>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    permissions: Option<RepoPermissions>,
}

impl From<RawRepo> for RepoSummary {
    fn from(r: RawRepo) -> Self {
        Self {
            id: r.id,
            name: r.name,
            full_name: r.full_name,
            owner: r.owner.map(|o| o.login),
            html_url: r.html_url,
            language: r.language,
            visibility: r.visibility,
            default_branch: r.default_branch,
            pushed_at: r.pushed_at,
            open_issues_count: r.open_issues_count,
            stargazers_count: r.stargazers_count,
            forks_count: r.forks_count,
            permissions: r.permissions.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct RawPull {
    id: u64,
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    user: Option<RawOwner>,
    #[serde(default)]
    head: Option<RawRef>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl RawPull {
    /// Reshape into a summary, or `None` when no Jira key can be found.
    fn into_linked_summary(self) -> Option<PullSummary> {
        let branch = self.head.map(|h| h.ref_name).unwrap_or_default();
        let jira_key = extract_jira_key_from_pull(&self.title, &branch)?;
        Some(PullSummary {
            id: self.id,
            number: self.number,
            title: self.title,
            html_url: self.html_url,
            state: self.state,
            user: self.user.map(|u| u.login),
            branch,
            created_at: self.created_at,
            updated_at: self.updated_at,
            jira_key,
        })
    }
}

/// Check that `segment` is a plain GitHub owner or repository name, so it
/// cannot add path segments, a query or a fragment to the request URL.
fn check_path_segment(kind: &str, segment: &str) -> Result<()> {
    let plain = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if plain {
        Ok(())
    } else {
        Err(BridgeError::InvalidInput(format!(
            "Invalid GitHub {kind} name: {segment:?}"
        )))
    }
}

/// `/repos/{owner}/{repo}` with both segments checked.
fn repo_path(owner: &str, repo: &str) -> Result<String> {
    check_path_segment("owner", owner)?;
    check_path_segment("repository", repo)?;
    Ok(format!("/repos/{owner}/{repo}"))
}

#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MergeRequest {
    merge_method: MergeMethod,
}

impl GitHubClient {
    /// Create a client against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_url(DEFAULT_GITHUB_API_URL)
    }

    /// Create a client with a custom API URL (GitHub Enterprise, tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_url(api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("pr-bridge/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, token: &str, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{path}", self.api_url))
            .header(AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Send a request and decode the JSON body, mapping non-2xx to `GitHubApi`.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::GitHubApi { status, body });
        }

        Ok(response.json().await?)
    }

    /// Validate a personal access token and return its owner.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::GitHubAuth`] carrying the HTTP status when GitHub
    /// rejects the token.
    #[instrument(skip(self, token))]
    pub async fn validate_token(&self, token: &str) -> Result<GitHubUser> {
        let response = self.get(token, "/user").send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::GitHubAuth { status, body });
        }

        let user: GitHubUser = response.json().await?;
        debug!(login = %user.login, "GitHub token validated");
        Ok(user)
    }

    /// List repositories visible to the token owner, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    #[instrument(skip(self, token))]
    pub async fn list_repos(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepoSummary>> {
        let request = self
            .get(token, "/user/repos")
            .query(&[("per_page", per_page), ("page", page)]);

        let repos: Vec<RawRepo> = Self::send_json(request).await?;
        debug!(count = repos.len(), "Fetched repositories");
        Ok(repos.into_iter().map(RepoSummary::from).collect())
    }

    /// List pull requests for a repository, keeping only those linked to a
    /// Jira issue through their title or head branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    #[instrument(skip(self, token))]
    pub async fn list_pulls(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        state: &str,
    ) -> Result<Vec<PullSummary>> {
        let request = self
            .get(token, &format!("{}/pulls", repo_path(owner, repo)?))
            .query(&[("state", state)]);

        let pulls: Vec<RawPull> = Self::send_json(request).await?;
        let total = pulls.len();
        let linked: Vec<PullSummary> = pulls
            .into_iter()
            .filter_map(RawPull::into_linked_summary)
            .collect();

        debug!(
            owner = %owner,
            repo = %repo,
            total,
            linked = linked.len(),
            "Fetched pull requests"
        );
        Ok(linked)
    }

    /// Submit an approving review on a pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    #[instrument(skip(self, token, body))]
    pub async fn approve_pull_request(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        number: u64,
        body: Option<&str>,
    ) -> Result<Value> {
        let url = format!(
            "{}{}/pulls/{number}/reviews",
            self.api_url,
            repo_path(owner, repo)?
        );
        let request = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&ReviewRequest {
                event: "APPROVE",
                body,
            });

        let review: Value = Self::send_json(request).await?;
        info!(owner = %owner, repo = %repo, number, "Approved pull request");
        Ok(review)
    }

    /// Merge a pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails (including 405 when the pull
    /// request is not mergeable).
    #[instrument(skip(self, token))]
    pub async fn merge_pull_request(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        number: u64,
        merge_method: MergeMethod,
    ) -> Result<Value> {
        let url = format!(
            "{}{}/pulls/{number}/merge",
            self.api_url,
            repo_path(owner, repo)?
        );
        let request = self
            .client
            .put(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&MergeRequest { merge_method });

        let merged: Value = Self::send_json(request).await?;
        info!(
            owner = %owner,
            repo = %repo,
            number,
            merged = merged.get("merged").and_then(serde_json::Value::as_bool).unwrap_or(false),
            "Merged pull request"
        );
        Ok(merged)
    }
}
