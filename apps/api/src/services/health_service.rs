//! Health check endpoint.
//!
//! Reports database connectivity and migration state for monitoring.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: &'static str,

    /// `connected` or `unavailable`
    pub database: &'static str,

    pub migrations: MigrationInfo,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct MigrationInfo {
    pub total: usize,
    pub applied: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.db.health_check().await;

    let (total, applied) = match state.db.migration_status().await {
        Ok(counts) => counts,
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            (0, 0)
        }
    };

    let healthy = connected && total == applied;
    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        database: if connected { "connected" } else { "unavailable" },
        migrations: MigrationInfo { total, applied },
        timestamp: Utc::now().to_rfc3339(),
    })
}
