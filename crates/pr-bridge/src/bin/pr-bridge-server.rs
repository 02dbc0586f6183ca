//! PR bridge service binary.
//!
//! Standalone HTTP service for resolver calls and GitHub webhook handling.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pr_bridge::{config::Config, server, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("pr_bridge=info".parse()?))
        .init();

    info!("Starting PR bridge service...");

    let config = Config::default();

    if config.webhook_secret.is_none() {
        info!("No GITHUB_WEBHOOK_SECRET configured - webhook signatures will not be verified");
    }

    // Tokens live only as long as the process
    let store = Arc::new(MemoryStore::new());

    let state = server::AppState::from_config(config.clone(), store.clone(), store)
        .context("Failed to build application state")?;

    let app = server::build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "PR bridge service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
