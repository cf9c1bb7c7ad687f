//! # billdesk-api
//!
//! JSON-over-HTTP surface of the billing backend.
//!
//! ## Request Flow
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │  Client  │──►│ CORS + Trace │──►│ Handler       │──►│ billdesk-db  │
//! │          │   │ (tower-http) │   │ parse/validate│   │ repositories │
//! └──────────┘   └──────────────┘   └───────────────┘   └──────────────┘
//!                                          │
//!                                          ▼
//!                                   ApiError ──► {"error": "..."}
//! ```
//!
//! The router is built by [`build_router`] so tests can drive it with
//! `tower::ServiceExt::oneshot` against an in-memory database.

pub mod auth;
pub mod config;
pub mod error;
pub mod services;

use std::sync::Arc;

use axum::Router;
use billdesk_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_lifetime_secs,
        );
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(services::health_service::router())
        .merge(services::auth_service::router())
        .merge(services::bill_service::router())
        .merge(services::bill_service::invoice_router())
        .merge(services::product_service::router())
        .merge(services::expense_service::router())
        .merge(services::sale_service::router())
        .merge(services::user_service::router())
        .merge(services::settings_service::router())
        .merge(services::report_service::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
