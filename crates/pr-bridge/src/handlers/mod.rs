//! HTTP handlers for resolver invocations and GitHub webhooks.

pub mod github;
pub mod resolvers;

pub use github::handle_github_webhook;
pub use resolvers::{error_status, handle_resolver};
