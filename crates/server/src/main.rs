//! qcache-mcp server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use qcache_client::{HttpDataSource, HttpSourceConfig};
use qcache_core::{AppConfig, CacheDb, QueryCache, QueryCacheConfig};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
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

    let db = CacheDb::from_config(&config)
        .await
        .with_context(|| format!("opening cache database at {}", config.db_path.display()))?;
    let source = HttpDataSource::new(HttpSourceConfig::from_app_config(&config)?)?;

    let cache = Arc::new(QueryCache::new(Arc::new(source), Arc::new(db), QueryCacheConfig::from(&config)));
    let _sweep = cache.spawn_expiry_sweep(config.sweep_interval());

    tracing::info!(
        db_path = %config.db_path.display(),
        ttl_secs = config.default_ttl_secs,
        "Starting qcache-mcp server on stdio transport"
    );

    let handler = handler::QcacheServer::new(cache);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
