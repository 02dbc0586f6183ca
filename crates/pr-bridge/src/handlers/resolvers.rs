//! Resolver invocation endpoint.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::error::BridgeError;
use crate::resolvers::ResolverContext;
use crate::server::AppState;

/// Invocation envelope sent by the host bridge.
#[derive(Debug, Deserialize)]
pub struct ResolverRequest {
    #[serde(default)]
    pub payload: Value,
    pub context: ResolverContext,
}

/// HTTP status for a resolver failure.
#[must_use]
pub const fn error_status(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        BridgeError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        BridgeError::UnknownResolver(_) => StatusCode::NOT_FOUND,
        BridgeError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        BridgeError::GitHubAuth { .. }
        | BridgeError::GitHubApi { .. }
        | BridgeError::JiraApi { .. }
        | BridgeError::Http(_) => StatusCode::BAD_GATEWAY,
        BridgeError::Json(_) | BridgeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run the named resolver for the calling account.
pub async fn handle_resolver(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Result<Json<ResolverRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(resolver = %name, error = %rejection.body_text(), "Malformed resolver request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            );
        }
    };

    match state
        .resolver
        .invoke(&name, request.payload, &request.context)
        .await
    {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(e) => {
            let status = error_status(&e);
            if e.is_client_error() {
                warn!(resolver = %name, error = %e, "Resolver rejected request");
            } else {
                error!(resolver = %name, error = %e, "Resolver failed");
            }
            (status, Json(json!({ "error": e.to_string() })))
        }
    }
}
