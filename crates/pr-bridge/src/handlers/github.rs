//! GitHub webhook handler.
//!
//! Handles `pull_request` events: when a PR is merged, the Jira issue named
//! in its title or branch is moved to "Done".

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::server::AppState;
use crate::webhooks::{process_pull_request_event, verify_github_signature, PullRequestEvent};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handle GitHub webhook
pub async fn handle_github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let event_type = header(&headers, "X-GitHub-Event");
    let delivery_id = header(&headers, "X-GitHub-Delivery").unwrap_or("unknown");

    info!(
        event_type = event_type.unwrap_or("unknown"),
        delivery_id = %delivery_id,
        "Received GitHub webhook"
    );

    // Verify signature if secret is configured
    if let Some(secret) = &state.config.webhook_secret {
        let Some(signature) = header(&headers, "X-Hub-Signature-256") else {
            warn!("Missing X-Hub-Signature-256 header");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing signature" })),
            );
        };

        if !verify_github_signature(&body, signature, secret) {
            warn!("Invalid webhook signature");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid signature" })),
            );
        }
        debug!("Webhook signature verified");
    }

    // Only process pull_request events
    if let Some(event_type) = event_type.filter(|e| *e != "pull_request") {
        debug!(event_type = %event_type, "Ignoring non-pull_request event");
        return (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "status": "ignored",
                "reason": "not_pull_request_event"
            })),
        );
    }

    let event = match PullRequestEvent::from_body(&body) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "Webhook handler error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            );
        }
    };

    let outcome = process_pull_request_event(&event, state.jira.as_ref()).await;

    let mut response = serde_json::to_value(&outcome).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut response {
        map.insert("ok".to_string(), Value::Bool(true));
    }
    (StatusCode::OK, Json(response))
}
