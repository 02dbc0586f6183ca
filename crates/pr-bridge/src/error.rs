//! Error types for the PR bridge.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to GitHub, Jira or the host stores.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// `GET /user` rejected the personal access token.
    #[error("GitHub auth failed: {} {body}", status.as_u16())]
    GitHubAuth { status: StatusCode, body: String },

    /// Any other non-success GitHub response.
    #[error("GitHub API failed: {} {body}", status.as_u16())]
    GitHubApi { status: StatusCode, body: String },

    /// Non-success Jira response.
    #[error("Jira API failed: {} {body}", status.as_u16())]
    JiraApi { status: StatusCode, body: String },

    /// HTTP request could not be sent or its body could not be read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Caller supplied a bad payload
    #[error("{0}")]
    InvalidInput(String),

    /// No GitHub token is stored for the account
    #[error("No GitHub token saved for this account")]
    NotAuthenticated,

    /// A required integration is not configured
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Resolver name did not match any definition
    #[error("Unknown resolver: {0}")]
    UnknownResolver(String),

    /// Host storage failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BridgeError {
    /// HTTP status returned by the upstream API, if this error came from one.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::GitHubAuth { status, .. }
            | Self::GitHubApi { status, .. }
            | Self::JiraApi { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller is at fault (bad payload, missing token, unknown resolver).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::NotAuthenticated | Self::UnknownResolver(_)
        )
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;
