//! Dashboard analytics handler

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use aegis_core::logic::analytics::compute_snapshot;

use super::blocking;
use crate::models::DashboardResponse;
use crate::{AppResult, AppState};

/// Snapshot recomputed from the full log on every call
pub async fn data(State(state): State<AppState>) -> AppResult<Json<DashboardResponse>> {
    let log = Arc::clone(&state.log);
    let options = Arc::clone(&state.snapshot_options);

    let data = blocking(move || {
        let records = log.read_all()?;
        Ok(compute_snapshot(&records, Utc::now(), &options))
    })
    .await?;

    Ok(Json(DashboardResponse { success: true, data }))
}
