//! sharecache server entry point.
//!
//! Loads configuration, installs the configured worker version and boots the
//! MCP server on stdio transport. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use sharecache_client::{FetchConfig, HttpFetcher, Registration, WorkerConfig};
use sharecache_core::{AppConfig, CacheDb, SnapshotStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod error;
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
    tracing::info!(version = %config.cache_version, worker_url = %config.worker_url, "Starting sharecache server on stdio transport");

    let store: Arc<dyn SnapshotStore> = if config.in_memory() {
        Arc::new(CacheDb::open_in_memory().await?)
    } else {
        Arc::new(CacheDb::open(&config.db_path).await?)
    };
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let registration = Arc::new(Registration::new(store, fetcher));

    if let Err(e) = registration.register(WorkerConfig::from_app_config(&config)?).await {
        tracing::error!(version = %config.cache_version, error = %e, "worker install failed; serving uncontrolled");
    }

    let handler = handler::ShareCacheServer::new(registration);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
