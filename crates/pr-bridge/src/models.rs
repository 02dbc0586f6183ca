//! Type definitions for GitHub and Jira entities, as served to the UI.
//!
//! These are pass-through copies of API response fields, reshaped into the
//! flat form the admin panel renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated GitHub user (`GET /user`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubUser {
    /// User login
    pub login: String,
    /// User ID
    #[serde(default)]
    pub id: u64,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Repository permissions of the token owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoPermissions {
    #[serde(default)]
    pub admin: Option<bool>,
    #[serde(default)]
    pub push: Option<bool>,
}

/// Repository row shown in the repository list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoSummary {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    /// Owner login
    pub owner: Option<String>,
    pub html_url: Option<String>,
    pub language: Option<String>,
    pub visibility: Option<String>,
    pub default_branch: Option<String>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub open_issues_count: u64,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub permissions: RepoPermissions,
}

/// Open pull request linked to a Jira issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullSummary {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub html_url: Option<String>,
    pub state: Option<String>,
    /// Author login
    pub user: Option<String>,
    /// Head branch
    pub branch: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Jira key found in the title or branch name
    #[serde(rename = "jiraKey")]
    pub jira_key: String,
}

/// Jira issue details shown next to a pull request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JiraIssueSummary {
    pub key: String,
    pub summary: String,
    /// Status name (e.g. "In Progress")
    pub status: String,
    /// Assignee display name
    pub assignee: Option<String>,
}

/// Result of moving a Jira issue through a workflow transition.
///
/// Failures are values, not errors: the caller decides whether to log or
/// surface them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub ok: bool,
    pub issue_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransitionOutcome {
    /// Successful transition.
    #[must_use]
    pub fn success(issue_key: impl Into<String>) -> Self {
        Self {
            ok: true,
            issue_key: issue_key.into(),
            error: None,
        }
    }

    /// Failed transition with a reason.
    #[must_use]
    pub fn failure(issue_key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            issue_key: issue_key.into(),
            error: Some(error.into()),
        }
    }
}

/// Whether the current account has a saved GitHub token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub has_token: bool,
    pub login: Option<String>,
}
