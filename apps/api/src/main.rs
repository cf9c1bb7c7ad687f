//! # Billdesk API
//!
//! HTTP server for the billing frontend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billdesk API Server                              │
//! │                                                                         │
//! │  Browser ───► HTTP (8080) ───► Services ───► SQLite (billdesk.db)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use billdesk_api::config::ApiConfig;
use billdesk_api::{build_router, AppState};
use billdesk_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so it can set the log filter
    let config = ApiConfig::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_target(true)
        .init();

    info!("Starting Billdesk API server...");
    info!(
        bind = %config.server.bind_address(),
        db_path = %config.database.path,
        verify_totals = config.billing.verify_totals,
        "Configuration loaded"
    );
    if config.auth.uses_dev_secret() {
        warn!("Using the built-in JWT secret; set BILLDESK_AUTH__JWT_SECRET in production");
    }

    // Connect to database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await
    .with_context(|| format!("opening {}", config.database.path))?;
    info!("Database ready");

    let addr = config.server.bind_address();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
