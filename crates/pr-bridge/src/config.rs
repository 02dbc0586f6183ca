//! Configuration for the PR bridge service.

use std::env;

/// Default GitHub REST endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// PR bridge configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// GitHub REST API base URL.
    pub github_api_url: String,
    /// Jira site URL (e.g. `https://your-domain.atlassian.net`).
    pub jira_base_url: Option<String>,
    /// Jira user email. When set, Jira calls use basic auth with the API token.
    pub jira_email: Option<String>,
    /// Jira API token (or bearer token when no email is configured).
    pub jira_api_token: Option<String>,
    /// GitHub webhook signing secret for signature verification.
    pub webhook_secret: Option<String>,
    /// Name of the Jira transition applied when a PR is merged.
    pub done_transition: String,
    /// Default page size for repository listings.
    pub repos_per_page: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("PR_BRIDGE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            github_api_url: env::var("GITHUB_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            jira_base_url: env::var("JIRA_BASE_URL").ok().filter(|s| !s.is_empty()),
            jira_email: env::var("JIRA_EMAIL").ok().filter(|s| !s.is_empty()),
            jira_api_token: env::var("JIRA_API_TOKEN").ok().filter(|s| !s.is_empty()),
            webhook_secret: env::var("GITHUB_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            done_transition: env::var("PR_BRIDGE_DONE_TRANSITION")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Done".to_string()),
            repos_per_page: env::var("PR_BRIDGE_REPOS_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(10),
        }
    }
}

impl Config {
    /// Override the GitHub API base URL.
    #[must_use]
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }

    /// Override the Jira connection settings.
    #[must_use]
    pub fn with_jira(
        mut self,
        base_url: impl Into<String>,
        email: Option<String>,
        api_token: impl Into<String>,
    ) -> Self {
        self.jira_base_url = Some(base_url.into());
        self.jira_email = email;
        self.jira_api_token = Some(api_token.into());
        self
    }

    /// Override the webhook signing secret.
    #[must_use]
    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret;
        self
    }
}
