//! CSV export handler

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use super::blocking;
use crate::{AppResult, AppState};

pub const EXPORT_FILENAME: &str = "aegis_detections.csv";

/// Whole log as a CSV attachment; header only when nothing is logged yet
pub async fn csv(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let log = Arc::clone(&state.log);
    let body = blocking(move || Ok(log.export_csv()?)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        body,
    ))
}
