//! swcache server entry point.
//!
//! Boots the caching intermediary, registers it, and serves its host events
//! as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig, RecordingClients, ServiceWorker};
use swcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = config.origin_url()?;
    tracing::info!(origin = %origin, db = %config.db_path.display(), "Starting swcache server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(ServiceWorker::new(&config, db, Arc::new(network))?);

    // No pages are open at boot, so there is nothing to claim yet.
    match worker.register(&RecordingClients::default()).await {
        Ok(report) => tracing::info!(
            cached = report.install.cached.len(),
            failed = report.install.failed.len(),
            activated = report.activate.is_some(),
            "registered"
        ),
        Err(e) => tracing::error!(error = %e, "registration failed; serving anyway"),
    }

    let handler = handler::SwCacheServer::new(worker, origin);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
