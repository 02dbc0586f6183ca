//! Jira REST API v3 client.
//!
//! Covers the three calls the bridge needs: issue lookup, transition
//! discovery and transition execution.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::jira_key::is_jira_key;
use crate::models::{JiraIssueSummary, TransitionOutcome};

/// Transition applied when no other name is configured.
pub const DEFAULT_DONE_TRANSITION: &str = "Done";

/// Jira REST client
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    done_transition: String,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFields {
    #[serde(default)]
    summary: String,
    status: RawStatus,
    #[serde(default)]
    assignee: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    fields: RawFields,
}

impl From<RawIssue> for JiraIssueSummary {
    fn from(issue: RawIssue) -> Self {
        Self {
            key: issue.key,
            summary: issue.fields.summary,
            status: issue.fields.status.name,
            assignee: issue
                .fields
                .assignee
                .and_then(|a| a.display_name)
                .filter(|n| !n.is_empty()),
        }
    }
}

/// Workflow transition available on an issue.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Debug, Serialize)]
struct TransitionId<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct PostTransitionBody<'a> {
    transition: TransitionId<'a>,
}

impl JiraClient {
    /// Create a new Jira client.
    ///
    /// # Arguments
    /// * `base_url` - Jira site URL, e.g. `https://your-domain.atlassian.net`
    /// * `email` - Account email; when present the token is sent with basic auth
    /// * `api_token` - API token, or a bearer token when `email` is `None`
    ///
    /// # Errors
    /// Returns error if headers cannot be constructed
    pub fn new(base_url: &str, email: Option<&str>, api_token: &str) -> Result<Self> {
        let auth_value = match email {
            Some(email) => format!("Basic {}", STANDARD.encode(format!("{email}:{api_token}"))),
            None => format!("Bearer {api_token}"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|_| BridgeError::InvalidInput("Invalid Jira credentials".to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            done_transition: DEFAULT_DONE_TRANSITION.to_string(),
        })
    }

    /// Build a client from service configuration.
    ///
    /// Returns `Ok(None)` when Jira is not configured.
    ///
    /// # Errors
    /// Returns error if the client cannot be constructed
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let (Some(base_url), Some(token)) = (&config.jira_base_url, &config.jira_api_token) else {
            return Ok(None);
        };

        let client = Self::new(base_url, config.jira_email.as_deref(), token)?
            .with_done_transition(&config.done_transition);
        Ok(Some(client))
    }

    /// Use a different transition name for [`Self::transition_issue_to_done`].
    #[must_use]
    pub fn with_done_transition(mut self, name: &str) -> Self {
        self.done_transition = name.to_string();
        self
    }

    /// Issue resource URL. Anything but a bare issue key is rejected so the
    /// key cannot steer the request to another Jira path.
    fn issue_url(&self, issue_key: &str) -> Result<String> {
        if !is_jira_key(issue_key) {
            return Err(BridgeError::InvalidInput(format!(
                "Invalid Jira issue key: {issue_key:?}"
            )));
        }
        Ok(format!("{}/rest/api/3/issue/{issue_key}", self.base_url))
    }

    async fn error_from(response: reqwest::Response) -> BridgeError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        BridgeError::JiraApi { status, body }
    }

    /// Fetch a single issue.
    ///
    /// # Errors
    /// Returns [`BridgeError::JiraApi`] on a non-success response.
    #[instrument(skip(self))]
    pub async fn fetch_issue(&self, issue_key: &str) -> Result<JiraIssueSummary> {
        let response = self.client.get(self.issue_url(issue_key)?).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let issue: RawIssue = response.json().await?;
        Ok(issue.into())
    }

    /// Fetch several issues one after another.
    ///
    /// Issues that fail to load are logged and left out of the result.
    pub async fn fetch_issues(&self, issue_keys: &[String]) -> Vec<JiraIssueSummary> {
        let mut issues = Vec::with_capacity(issue_keys.len());

        for key in issue_keys {
            match self.fetch_issue(key).await {
                Ok(issue) => issues.push(issue),
                Err(e) => {
                    warn!(issue_key = %key, error = %e, "Skipping Jira issue that failed to load");
                }
            }
        }

        debug!(
            requested = issue_keys.len(),
            loaded = issues.len(),
            "Fetched Jira issues"
        );
        issues
    }

    /// List the transitions currently available on an issue.
    ///
    /// # Errors
    /// Returns [`BridgeError::JiraApi`] on a non-success response.
    #[instrument(skip(self))]
    pub async fn get_transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
        let url = format!("{}/transitions", self.issue_url(issue_key)?);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: TransitionsResponse = response.json().await?;
        Ok(body.transitions)
    }

    async fn post_transition(&self, issue_key: &str, transition_id: &str) -> Result<()> {
        let url = format!("{}/transitions", self.issue_url(issue_key)?);
        let response = self
            .client
            .post(&url)
            .json(&PostTransitionBody {
                transition: TransitionId { id: transition_id },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    /// Move an issue through the transition named `transition_name`
    /// (case-insensitive).
    ///
    /// Lookup and execution failures come back as a failed
    /// [`TransitionOutcome`] instead of an error.
    #[instrument(skip(self))]
    pub async fn transition_issue(&self, issue_key: &str, transition_name: &str) -> TransitionOutcome {
        let transitions = match self.get_transitions(issue_key).await {
            Ok(t) => t,
            Err(e) => {
                warn!(issue_key = %issue_key, error = %e, "Failed to load Jira transitions");
                return TransitionOutcome::failure(issue_key, e.to_string());
            }
        };

        let Some(transition) = transitions
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(transition_name))
        else {
            let available: Vec<&str> = transitions.iter().map(|t| t.name.as_str()).collect();
            warn!(
                issue_key = %issue_key,
                wanted = %transition_name,
                available = ?available,
                "No matching Jira transition"
            );
            return TransitionOutcome::failure(
                issue_key,
                format!("No '{transition_name}' transition available for {issue_key}"),
            );
        };

        if let Err(e) = self.post_transition(issue_key, &transition.id).await {
            warn!(issue_key = %issue_key, error = %e, "Failed to transition Jira issue");
            return TransitionOutcome::failure(issue_key, e.to_string());
        }

        info!(
            issue_key = %issue_key,
            transition_id = %transition.id,
            transition = %transition.name,
            "Transitioned Jira issue"
        );
        TransitionOutcome::success(issue_key)
    }

    /// Move an issue to the configured "Done" transition.
    pub async fn transition_issue_to_done(&self, issue_key: &str) -> TransitionOutcome {
        self.transition_issue(issue_key, &self.done_transition).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_reshape() {
        let raw: RawIssue = serde_json::from_value(json!({
            "key": "PROJ-123",
            "fields": {
                "summary": "Fix login bug",
                "status": { "name": "In Progress" },
                "assignee": { "displayName": "Andriy" }
            }
        }))
        .unwrap();

        assert_eq!(
            JiraIssueSummary::from(raw),
            JiraIssueSummary {
                key: "PROJ-123".to_string(),
                summary: "Fix login bug".to_string(),
                status: "In Progress".to_string(),
                assignee: Some("Andriy".to_string()),
            }
        );
    }

    #[test]
    fn test_unassigned_issue() {
        let raw: RawIssue = serde_json::from_value(json!({
            "key": "PROJ-9",
            "fields": {
                "summary": "Orphan",
                "status": { "name": "To Do" },
                "assignee": null
            }
        }))
        .unwrap();
        assert!(JiraIssueSummary::from(raw).assignee.is_none());
    }

    #[test]
    fn test_transition_body_shape() {
        let body = serde_json::to_value(PostTransitionBody {
            transition: TransitionId { id: "31" },
        })
        .unwrap();
        assert_eq!(body, json!({ "transition": { "id": "31" } }));
    }

    #[test]
    fn test_from_config_requires_url_and_token() {
        // Built directly so the test never reads the process environment
        let config = Config {
            port: 8080,
            github_api_url: crate::config::DEFAULT_GITHUB_API_URL.to_string(),
            jira_base_url: None,
            jira_email: None,
            jira_api_token: None,
            webhook_secret: None,
            done_transition: "Closed".to_string(),
            repos_per_page: 10,
        };
        assert!(JiraClient::from_config(&config).unwrap().is_none());

        let config = config.with_jira("https://acme.atlassian.net/", None, "token");
        let client = JiraClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.base_url, "https://acme.atlassian.net");
        assert_eq!(
            client.issue_url("A1-1").unwrap(),
            "https://acme.atlassian.net/rest/api/3/issue/A1-1"
        );
        assert_eq!(client.done_transition, "Closed");
    }

    #[test]
    fn test_issue_url_rejects_path_tricks() {
        let client = JiraClient::new("https://acme.atlassian.net", None, "token").unwrap();
        for key in ["../myself", "PROJ-1/../../myself", "PROJ-1?expand=all", "", "proj-1"] {
            assert!(
                matches!(client.issue_url(key), Err(BridgeError::InvalidInput(_))),
                "accepted {key:?}"
            );
        }
    }
}
