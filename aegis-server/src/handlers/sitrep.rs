//! SITREP and analyst chat handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::models::{ChatRequest, ChatResponse, SitrepResponse};
use crate::{AppError, AppResult, AppState};

/// GET /api/sitrep/:scan_id
pub async fn get(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> AppResult<Json<SitrepResponse>> {
    let entry = state
        .sitreps
        .get(&scan_id)
        .ok_or_else(|| AppError::NotFound("SITREP not found".to_string()))?;

    Ok(Json(SitrepResponse {
        success: true,
        scan_id: entry.scan_id,
        sitrep: entry.sitrep,
        model: entry.model,
        tokens: entry.tokens,
        timestamp: entry.timestamp,
        chat_history: entry.chat_history,
    }))
}

/// POST /api/chat - follow-up question about a stored scan
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let scan_id = req.scan_id.trim().to_string();
    let message = req.message.trim().to_string();
    if scan_id.is_empty() || message.is_empty() {
        return Err(AppError::BadRequest("Missing scan_id or message".to_string()));
    }

    let analyst = state.analyst.clone().ok_or(AppError::AnalystUnavailable)?;
    let entry = state
        .sitreps
        .get(&scan_id)
        .ok_or_else(|| AppError::NotFound("Scan not found".to_string()))?;

    let reply = analyst
        .chat(&scan_id, &entry.detection_context, &entry.sitrep, &entry.chat_history, &message)
        .await?;

    let sitreps = Arc::clone(&state.sitreps);
    let (id, answer) = (scan_id.clone(), reply.answer.clone());
    tokio::task::spawn_blocking(move || sitreps.add_chat_exchange(&id, &message, &answer)).await??;

    Ok(Json(ChatResponse {
        success: true,
        scan_id,
        answer: reply.answer,
        tokens: reply.tokens,
    }))
}
