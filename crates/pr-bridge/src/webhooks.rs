//! GitHub `pull_request` webhook payload parsing and signature verification.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::jira_client::JiraClient;
use crate::jira_key::extract_jira_key_from_pull;
use crate::models::TransitionOutcome;

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest in `X-Hub-Signature-256`.
const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a GitHub webhook signature using HMAC-SHA256.
///
/// # Arguments
/// * `body` - Raw webhook body bytes
/// * `signature` - Value of the `X-Hub-Signature-256` header (`sha256=<hex>`)
/// * `secret` - Webhook signing secret
///
/// # Returns
/// `true` if signature is valid, `false` otherwise
#[must_use]
pub fn verify_github_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    let Ok(signature_bytes) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    computed.as_slice().ct_eq(&signature_bytes).into()
}

/// GitHub PR event payload (only the fields the bridge reads)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestEvent {
    /// Action type (opened, closed, synchronize, ...)
    #[serde(default)]
    pub action: Option<String>,
    /// Pull request details
    #[serde(default)]
    pub pull_request: Option<PullRequest>,
    /// Repository info
    #[serde(default)]
    pub repository: Option<Repository>,
}

/// GitHub Pull Request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    /// Source branch
    #[serde(default)]
    pub head: Option<GitRef>,
    /// Whether PR was merged
    #[serde(default)]
    pub merged: Option<bool>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Git reference (branch)
#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref", default)]
    pub ref_name: Option<String>,
}

/// GitHub Repository
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Full name (org/repo)
    #[serde(default)]
    pub full_name: Option<String>,
}

impl PullRequestEvent {
    /// Parse a webhook body. An empty body is treated as an empty event.
    ///
    /// # Errors
    /// Returns the JSON error for a malformed body.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    /// Event action, empty when absent or null.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or_default()
    }

    /// Closed with the merge flag set.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.action() == "closed"
            && self
                .pull_request
                .as_ref()
                .is_some_and(|pr| pr.merged == Some(true))
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.title.as_deref())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn branch(&self) -> &str {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.head.as_ref())
            .and_then(|h| h.ref_name.as_deref())
            .unwrap_or_default()
    }

    /// Jira key from the PR title, falling back to the head branch.
    #[must_use]
    pub fn jira_key(&self) -> Option<String> {
        extract_jira_key_from_pull(self.title(), self.branch())
    }
}

/// What the webhook did with an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Event needs no action
    Ignored { reason: String },
    /// Merged PR without a Jira key in title or branch
    NoJiraKey,
    /// Merged PR, but no Jira client to act with
    JiraNotConfigured { issue_key: String },
    /// Transition attempted
    Transitioned { transition: TransitionOutcome },
}

/// Act on a parsed `pull_request` event: transition the linked Jira issue to
/// "Done" when the PR was merged.
pub async fn process_pull_request_event(
    event: &PullRequestEvent,
    jira: Option<&JiraClient>,
) -> WebhookOutcome {
    let repo = event
        .repository
        .as_ref()
        .and_then(|r| r.full_name.as_deref())
        .unwrap_or("unknown");
    let number = event.pull_request.as_ref().and_then(|pr| pr.number);

    info!(
        action = %event.action(),
        repo = %repo,
        pr_number = ?number,
        merged = event.pull_request.as_ref().and_then(|pr| pr.merged).unwrap_or(false),
        "GitHub pull_request event"
    );

    if !event.is_merged() {
        debug!(action = %event.action(), "Ignoring non-merged PR event");
        return WebhookOutcome::Ignored {
            reason: "not_merged_pr".to_string(),
        };
    }

    let Some(issue_key) = event.jira_key() else {
        info!(
            title = %event.title(),
            branch = %event.branch(),
            "Merged PR has no Jira key"
        );
        return WebhookOutcome::NoJiraKey;
    };

    info!(
        issue_key = %issue_key,
        title = %event.title(),
        branch = %event.branch(),
        "Transitioning issue for merged PR"
    );

    let Some(jira) = jira else {
        warn!(issue_key = %issue_key, "Jira client not configured, cannot transition");
        return WebhookOutcome::JiraNotConfigured { issue_key };
    };

    let transition = jira.transition_issue_to_done(&issue_key).await;
    WebhookOutcome::Transitioned { transition }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_signature_valid() {
        let body = br#"{"action":"closed"}"#;
        assert!(verify_github_signature(body, &sign(body, "s3cret"), "s3cret"));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let body = br#"{"action":"closed"}"#;
        assert!(!verify_github_signature(body, &sign(body, "other"), "s3cret"));
    }

    #[test]
    fn test_verify_signature_malformed() {
        let body = b"payload";
        assert!(!verify_github_signature(body, "sha256=not-hex", "s3cret"));
        // Missing prefix
        let bare = sign(body, "s3cret").trim_start_matches("sha256=").to_string();
        assert!(!verify_github_signature(body, &bare, "s3cret"));
    }

    #[test]
    fn test_empty_body_is_empty_event() {
        let event = PullRequestEvent::from_body(b"").unwrap();
        assert_eq!(event.action(), "");
        assert!(!event.is_merged());
        assert!(PullRequestEvent::from_body(b"{not json").is_err());
    }

    #[test]
    fn test_merged_event_key_from_branch() {
        let event: PullRequestEvent = serde_json::from_value(json!({
            "action": "closed",
            "pull_request": {
                "number": 12,
                "title": "Make login faster",
                "merged": true,
                "head": { "ref": "feature/MDP-7-login" }
            },
            "repository": { "full_name": "acme/web" }
        }))
        .unwrap();

        assert!(event.is_merged());
        assert_eq!(event.jira_key().as_deref(), Some("MDP-7"));
    }

    #[test]
    fn test_closed_unmerged_is_not_merge() {
        let event: PullRequestEvent = serde_json::from_value(json!({
            "action": "closed",
            "pull_request": { "title": "ABC-1 abandon", "merged": false }
        }))
        .unwrap();
        assert!(!event.is_merged());
    }

    #[tokio::test]
    async fn test_process_ignores_opened() {
        let event: PullRequestEvent = serde_json::from_value(json!({
            "action": "opened",
            "pull_request": { "title": "ABC-1 new", "merged": false }
        }))
        .unwrap();

        assert_eq!(
            process_pull_request_event(&event, None).await,
            WebhookOutcome::Ignored {
                reason: "not_merged_pr".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_process_merged_without_key_or_jira() {
        let no_key: PullRequestEvent = serde_json::from_value(json!({
            "action": "closed",
            "pull_request": { "title": "chore", "merged": true, "head": { "ref": "main" } }
        }))
        .unwrap();
        assert_eq!(
            process_pull_request_event(&no_key, None).await,
            WebhookOutcome::NoJiraKey
        );

        let keyed: PullRequestEvent = serde_json::from_value(json!({
            "action": "closed",
            "pull_request": { "title": "ABC-1 done", "merged": true }
        }))
        .unwrap();
        let outcome = process_pull_request_event(&keyed, None).await;
        assert_eq!(
            outcome,
            WebhookOutcome::JiraNotConfigured {
                issue_key: "ABC-1".to_string()
            }
        );
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "status": "jira_not_configured", "issue_key": "ABC-1" })
        );
    }

    #[tokio::test]
    async fn test_null_fields_are_tolerated() {
        let event = PullRequestEvent::from_body(
            br#"{"action":null,"pull_request":{"title":null,"merged":null,"head":{"ref":null}},"repository":{"full_name":null}}"#,
        )
        .unwrap();
        assert_eq!(event.action(), "");
        assert_eq!(event.branch(), "");
        assert!(!event.is_merged());
        assert_eq!(
            process_pull_request_event(&event, None).await,
            WebhookOutcome::Ignored {
                reason: "not_merged_pr".to_string()
            }
        );

        let closed = PullRequestEvent::from_body(
            br#"{"action":"closed","pull_request":{"title":"ABC-2 x","merged":null}}"#,
        )
        .unwrap();
        assert!(!closed.is_merged());
    }
}
