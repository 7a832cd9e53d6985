//! AEGIS Detection Server
//!
//! HTTP surface over `aegis-core`: image upload and detection, detection
//! log, dashboard analytics, CSV export, SITREPs and analyst chat.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      AEGIS SERVER                          │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────────┐   ┌───────────────┐  │
//! │  │  Routes   │──▶│  Pipeline        │──▶│ Detection log │  │
//! │  │  (Axum)   │   │  (blocking pool) │   │ (CSV)         │  │
//! │  └─────┬─────┘   └──────────────────┘   └───────────────┘  │
//! │        │  enrichment (async, degrades on failure)          │
//! │        ▼                                                   │
//! │  ┌───────────┐   ┌──────────────────┐                      │
//! │  │ Geocoder  │   │ Analyst + SITREP │                      │
//! │  │           │   │ store (JSON)     │                      │
//! │  └───────────┘   └──────────────────┘                      │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;
mod handlers;
mod models;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
    services::ServeDir,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aegis_core::logic::analytics::SnapshotOptions;
use aegis_core::logic::analyst::{AnalystClient, SitrepStore};
use aegis_core::logic::detector::ModelProfile;
use aegis_core::logic::geo::ReverseGeocoder;
use aegis_core::logic::pipeline::Pipeline;
use aegis_core::DetectionLog;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // JSON lines in production, human-readable otherwise
    let json_logs = std::env::var("ENVIRONMENT").map(|e| e == "production").unwrap_or(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "aegis_server=debug,aegis_core=info,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let config = config::Config::from_env();
    tracing::info!("AEGIS detection server v{} starting ({})", aegis_core::constants::APP_VERSION, config.environment);
    if config.is_production() && config.allow_degraded {
        tracing::warn!("AEGIS_ALLOW_DEGRADED is set in production");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = bootstrap::build_state(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub profile: ModelProfile,
    /// `None` when the model failed to load (degraded mode)
    pub pipeline: Option<Arc<Pipeline>>,
    pub log: Arc<DetectionLog>,
    pub sitreps: Arc<SitrepStore>,
    pub geocoder: Option<Arc<ReverseGeocoder>>,
    pub analyst: Option<Arc<AnalystClient>>,
    pub snapshot_options: Arc<SnapshotOptions>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/detect", post(handlers::detect::detect))
        .route("/logs", get(handlers::logs::recent))

        // Analytics
        .route("/api/dashboard-data", get(handlers::dashboard::data))
        .route("/api/export-csv", get(handlers::export::csv))

        // Analyst
        .route("/api/sitrep/:scan_id", get(handlers::sitrep::get))
        .route("/api/chat", post(handlers::sitrep::chat))

        .nest_service(models::UPLOADS_URL_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
