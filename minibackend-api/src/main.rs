//! # Mini Backend API Server
//!
//! HTTP server exposing customer endpoints backed by a pooled PostgreSQL
//! connection layer.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Verify the `customers` table exists; exit non-zero otherwise
//! 3. Serve until Ctrl-C, then close the connection pool
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p minibackend-api
//! ```

use minibackend_api::{
    app::{build_router, AppState},
    config::Config,
};
use minibackend_shared::db::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "minibackend_api=debug,minibackend_shared=debug,tower_http=debug,perf=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Mini Backend API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    tracing::debug!(database = ?config.database, "Configuration loaded");

    let db = Database::new(config.database.clone());

    // Refuse to serve without the schema
    if let Err(err) = db.verify_schema_ready().await {
        tracing::error!(error = %err, "Database is not ready, aborting startup");
        db.close().await;
        return Err(err.into());
    }
    tracing::info!(stats = ?db.stats(), "Connection pool ready");

    let state = AppState::new(db.clone(), config.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(stats = ?db.stats(), "Server stopped");
    db.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
