//! HTTP server for resolver calls and GitHub webhooks.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::TokenService;
use crate::config::Config;
use crate::error::Result;
use crate::github_client::GitHubClient;
use crate::handlers::{handle_github_webhook, handle_resolver};
use crate::jira_client::JiraClient;
use crate::resolvers::Resolver;
use crate::storage::{KeyValueStore, SecretStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Config,
    /// Resolver dispatcher.
    pub resolver: Resolver,
    /// Jira API client, when configured.
    pub jira: Option<JiraClient>,
}

impl AppState {
    /// Wire clients and stores together from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created.
    pub fn from_config(
        config: Config,
        secrets: Arc<dyn SecretStore>,
        values: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let github = GitHubClient::with_url(&config.github_api_url)?;
        let jira = JiraClient::from_config(&config)?;

        if jira.is_some() {
            info!("Jira API client configured");
        } else {
            info!("No JIRA_BASE_URL/JIRA_API_TOKEN configured - Jira calls will be disabled");
        }

        let resolver = Resolver::new(TokenService::new(github, secrets, values), jira.clone())
            .with_repos_per_page(config.repos_per_page);

        Ok(Self {
            config,
            resolver,
            jira,
        })
    }
}

/// Build the HTTP router for the bridge service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/resolvers/{name}", post(handle_resolver))
        .route("/webhooks/github", post(handle_github_webhook))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Readiness check endpoint. Reports which integrations are wired up.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "jira": state.jira.is_some(),
            "webhook_signatures": state.config.webhook_secret.is_some()
        })),
    )
}
