//! Detection log handler

use std::sync::Arc;

use axum::{extract::{Query, State}, Json};

use aegis_core::constants::RECENT_LOGS_LIMIT;

use super::blocking;
use crate::models::{LogsQuery, LogsResponse};
use crate::{AppResult, AppState};

/// Most recent log rows, oldest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> AppResult<Json<LogsResponse>> {
    let limit = query.limit.unwrap_or(RECENT_LOGS_LIMIT);
    let log = Arc::clone(&state.log);

    let logs = blocking(move || Ok(log.recent(limit)?)).await?;

    Ok(Json(LogsResponse {
        success: true,
        count: logs.len(),
        logs,
    }))
}
