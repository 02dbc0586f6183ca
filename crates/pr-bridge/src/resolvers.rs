//! Resolver functions invoked from the admin panel.
//!
//! Each resolver takes a JSON payload plus the calling account's context and
//! returns JSON. Names match what the UI invokes (`listPulls`, `mergePR`, ...).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::TokenService;
use crate::error::{BridgeError, Result};
use crate::github_client::{MergeMethod, DEFAULT_REPOS_PER_PAGE};
use crate::jira_client::JiraClient;
use crate::jira_key::is_jira_key;

/// Caller identity supplied by the host with every invocation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolverContext {
    pub account_id: String,
}

impl ResolverContext {
    #[must_use]
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }
}

/// Resolver functions known to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverFunction {
    ValidateAndSaveToken,
    GetAuthStatus,
    ClearToken,
    ListRepos,
    ListPulls,
    GetIssues,
    ApprovePr,
    MergePr,
    TransitionIssue,
}

impl ResolverFunction {
    pub const ALL: [Self; 9] = [
        Self::ValidateAndSaveToken,
        Self::GetAuthStatus,
        Self::ClearToken,
        Self::ListRepos,
        Self::ListPulls,
        Self::GetIssues,
        Self::ApprovePr,
        Self::MergePr,
        Self::TransitionIssue,
    ];

    /// Name the UI uses to invoke this function.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ValidateAndSaveToken => "validateAndSaveToken",
            Self::GetAuthStatus => "getAuthStatus",
            Self::ClearToken => "clearToken",
            Self::ListRepos => "listRepos",
            Self::ListPulls => "listPulls",
            Self::GetIssues => "getIssues",
            Self::ApprovePr => "approvePR",
            Self::MergePr => "mergePR",
            Self::TransitionIssue => "transitionIssue",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenPayload {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListReposPayload {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListPullsPayload {
    owner: String,
    repo: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetIssuesPayload {
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullActionPayload {
    owner: String,
    repo: String,
    number: u64,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    merge_method: Option<MergeMethod>,
}

#[derive(Debug, Deserialize)]
struct TransitionPayload {
    key: String,
}

fn parse_payload<T: DeserializeOwned>(function: ResolverFunction, payload: Value) -> Result<T> {
    let payload = if payload.is_null() { json!({}) } else { payload };
    serde_json::from_value(payload).map_err(|e| {
        BridgeError::InvalidInput(format!("Invalid payload for {}: {e}", function.name()))
    })
}

fn require_jira_key(key: &str) -> Result<()> {
    if is_jira_key(key) {
        Ok(())
    } else {
        Err(BridgeError::InvalidInput(format!(
            "Invalid Jira issue key: {key:?}"
        )))
    }
}

fn require_repo(owner: &str, repo: &str) -> Result<()> {
    if owner.trim().is_empty() || repo.trim().is_empty() {
        return Err(BridgeError::InvalidInput(
            "Both owner and repo are required".to_string(),
        ));
    }
    Ok(())
}

/// Dispatches resolver calls to the token service and API clients.
#[derive(Clone)]
pub struct Resolver {
    tokens: TokenService,
    jira: Option<JiraClient>,
    repos_per_page: u32,
}

impl Resolver {
    #[must_use]
    pub fn new(tokens: TokenService, jira: Option<JiraClient>) -> Self {
        Self {
            tokens,
            jira,
            repos_per_page: DEFAULT_REPOS_PER_PAGE,
        }
    }

    /// Page size used by `listRepos` when the payload omits `perPage`.
    #[must_use]
    pub fn with_repos_per_page(mut self, per_page: u32) -> Self {
        self.repos_per_page = per_page;
        self
    }

    fn jira(&self) -> Result<&JiraClient> {
        self.jira
            .as_ref()
            .ok_or_else(|| BridgeError::NotConfigured("Jira".to_string()))
    }

    /// Invoke a resolver by name.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownResolver`] for an unrecognised name,
    /// [`BridgeError::InvalidInput`] for a malformed payload, and whatever
    /// the underlying call fails with otherwise.
    pub async fn invoke(&self, name: &str, payload: Value, context: &ResolverContext) -> Result<Value> {
        let function = ResolverFunction::from_name(name)
            .ok_or_else(|| BridgeError::UnknownResolver(name.to_string()))?;
        self.call(function, payload, context).await
    }

    /// Invoke a known resolver function.
    ///
    /// # Errors
    ///
    /// See [`Self::invoke`].
    #[allow(clippy::too_many_lines)]
    pub async fn call(
        &self,
        function: ResolverFunction,
        payload: Value,
        context: &ResolverContext,
    ) -> Result<Value> {
        let account_id = context.account_id.as_str();
        debug!(function = function.name(), account_id = %account_id, "Resolver invoked");

        match function {
            ResolverFunction::ValidateAndSaveToken => {
                let p: TokenPayload = parse_payload(function, payload)?;
                let saved = self
                    .tokens
                    .validate_and_save_token(account_id, p.token.as_deref().unwrap_or_default())
                    .await?;
                Ok(serde_json::to_value(saved)?)
            }
            ResolverFunction::GetAuthStatus => {
                let status = self.tokens.get_auth_status(account_id).await?;
                Ok(serde_json::to_value(status)?)
            }
            ResolverFunction::ClearToken => {
                let cleared = self.tokens.clear_token(account_id).await?;
                Ok(serde_json::to_value(cleared)?)
            }
            ResolverFunction::ListRepos => {
                let p: ListReposPayload = parse_payload(function, payload)?;
                let token = self.tokens.require_github_token(account_id).await?;
                let repos = self
                    .tokens
                    .github()
                    .list_repos(
                        &token,
                        p.page.unwrap_or(1).max(1),
                        p.per_page.unwrap_or(self.repos_per_page).max(1),
                    )
                    .await?;
                Ok(serde_json::to_value(repos)?)
            }
            ResolverFunction::ListPulls => {
                let p: ListPullsPayload = parse_payload(function, payload)?;
                require_repo(&p.owner, &p.repo)?;
                let token = self.tokens.require_github_token(account_id).await?;
                let state = p.state.as_deref().unwrap_or("open");
                let pulls = self
                    .tokens
                    .github()
                    .list_pulls(&token, &p.owner, &p.repo, state)
                    .await?;
                Ok(serde_json::to_value(pulls)?)
            }
            ResolverFunction::GetIssues => {
                let p: GetIssuesPayload = parse_payload(function, payload)?;
                if p.keys.is_empty() {
                    return Ok(json!([]));
                }
                for key in &p.keys {
                    require_jira_key(key)?;
                }
                let issues = self.jira()?.fetch_issues(&p.keys).await;
                Ok(serde_json::to_value(issues)?)
            }
            ResolverFunction::ApprovePr => {
                let p: PullActionPayload = parse_payload(function, payload)?;
                require_repo(&p.owner, &p.repo)?;
                let token = self.tokens.require_github_token(account_id).await?;
                self.tokens
                    .github()
                    .approve_pull_request(&token, &p.owner, &p.repo, p.number, p.body.as_deref())
                    .await
            }
            ResolverFunction::MergePr => {
                let p: PullActionPayload = parse_payload(function, payload)?;
                require_repo(&p.owner, &p.repo)?;
                let token = self.tokens.require_github_token(account_id).await?;
                self.tokens
                    .github()
                    .merge_pull_request(
                        &token,
                        &p.owner,
                        &p.repo,
                        p.number,
                        p.merge_method.unwrap_or_default(),
                    )
                    .await
            }
            ResolverFunction::TransitionIssue => {
                let p: TransitionPayload = parse_payload(function, payload)?;
                require_jira_key(&p.key)?;
                let outcome = self.jira()?.transition_issue_to_done(&p.key).await;
                info!(issue_key = %p.key, ok = outcome.ok, "Manual Jira transition");
                Ok(serde_json::to_value(outcome)?)
            }
        }
    }
}
