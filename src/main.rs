//! Site Custody Service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the site store (Postgres pool + migrations, or in-memory)
//! 3. Build HTTP router with routes and middleware
//! 4. Serve until SIGINT/SIGTERM, then close the store

use std::{sync::Arc, time::Duration};

use site_custody_server::{
    AppState, app,
    config::Config,
    db,
    store::{SiteStore, memory::MemorySiteStore, postgres::PgSiteStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;
    let policy = config.lifecycle_policy();
    tracing::info!(
        history_limit = policy.history_limit,
        authorization = ?policy.authorization,
        duplicate_requests = ?policy.duplicate_requests,
        "Configuration loaded"
    );

    let store: Arc<dyn SiteStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(
                url,
                config.database_max_connections,
                Duration::from_secs(config.database_acquire_timeout_secs),
            )
            .await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgSiteStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store. State will not survive restarts.");
            Arc::new(MemorySiteStore::new())
        }
    };

    let state = AppState {
        max_body_bytes: config.max_body_bytes,
        ..AppState::new(store.clone(), policy)
    };
    let router = app(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Site store closed, shutting down");

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
