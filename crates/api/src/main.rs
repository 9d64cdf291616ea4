//! Agent Metrics Adapter - external metrics API for self-hosted agent pools
//!
//! Main entry point: load configuration, start the poll loop, serve reads.

use agentmetrics_api::utils::logging::init_tracing;
use agentmetrics_api::utils::shutdown::shutdown_signal;
use agentmetrics_api::{router, AppContext};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before tracing so RUST_LOG and LOG_FORMAT can come from it
    let dotenv = dotenvy::dotenv();
    init_tracing()?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => debug!(error = %err, "No .env file loaded"),
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Agent metrics adapter starting");

    // Fail fast: missing credentials or an unusable cache stop the process
    let context = AppContext::new().context("failed to initialise adapter")?;
    context.start().await.context("failed to start poll loop")?;

    let address = context.config.server.bind_address.clone();
    let listener =
        TcpListener::bind(&address).await.with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "Serving external metrics API");

    axum::serve(listener, router(context.server_state()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    context.shutdown().await.context("failed to stop poll loop")?;
    info!("Agent metrics adapter stopped");
    Ok(())
}
