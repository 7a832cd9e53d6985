//! Health check handler

use axum::{extract::State, http::StatusCode, Json};

use crate::models::HealthResponse;
use crate::AppState;

/// 503 while the model is not loaded
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let model_ready = state.pipeline.is_some();
    let status = if model_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    let body = HealthResponse {
        status: if model_ready { "healthy" } else { "degraded" },
        model_ready,
        profile: state.profile.to_string(),
        detector: state.pipeline.as_ref().map(|p| p.detector_name().to_string()),
        stalled_inferences: state.pipeline.as_ref().map_or(0, |p| p.stalled_inferences()),
        analyst_enabled: state.analyst.is_some(),
        geocoding_enabled: state.geocoder.is_some(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    };

    (status, Json(body))
}
