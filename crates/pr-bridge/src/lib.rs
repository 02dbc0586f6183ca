//! GitHub pull request to Jira issue bridge.
//!
//! This crate provides:
//! - GitHub REST client for token validation, repositories and pull requests
//! - Jira REST client for issue lookup and workflow transitions
//! - Jira key detection in PR titles and branch names
//! - Per-account token storage over host key-value and secret stores
//! - Resolver functions invoked by the admin panel
//! - HTTP server for resolver calls and GitHub merge webhooks

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Many async API methods can fail

pub mod auth;
pub mod config;
pub mod error;
pub mod github_client;
pub mod handlers;
pub mod jira_client;
pub mod jira_key;
pub mod models;
pub mod resolvers;
pub mod server;
pub mod storage;
pub mod webhooks;

pub use auth::TokenService;
pub use config::Config;
pub use error::{BridgeError, Result};
pub use github_client::{GitHubClient, MergeMethod};
pub use jira_client::JiraClient;
pub use jira_key::{extract_jira_key, extract_jira_key_from_pull};
pub use models::*;
pub use resolvers::{Resolver, ResolverContext, ResolverFunction};
pub use storage::{KeyValueStore, MemoryStore, SecretStore};
pub use webhooks::{verify_github_signature, PullRequestEvent, WebhookOutcome};
