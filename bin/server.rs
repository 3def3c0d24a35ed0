// Pocket Ledger - Web Server
// JSON API over the ledger engine

use anyhow::{Context, Result};
use pocket_ledger::{api, Book, StoreConfig};
use std::env;
use tracing::info;

/// Environment variable holding the bind address
const ADDR_ENV: &str = "POCKET_LEDGER_ADDR";
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<()> {
    pocket_ledger::init_tracing();

    let config = StoreConfig::from_env();
    let book = Book::open(&config)
        .with_context(|| format!("Failed to open ledger at {}", config.path.display()))?;
    info!(path = %config.path.display(), "database opened");

    let app = api::router(book);

    let addr = env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "server running; API under /api");

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
