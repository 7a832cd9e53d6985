//! Error handling

use axum::{
    extract::multipart::MultipartError,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use aegis_core::logic::analyst::{AnalystError, StoreError};
use aegis_core::logic::telemetry::LogError;
use aegis_core::PipelineError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    BadRequest(String),
    UnsupportedMediaType(String),
    PayloadTooLarge,
    NotFound(String),

    // Scan errors
    UnprocessableImage(String),
    ModelUnavailable(String),
    InferenceTimeout(u64),
    InferenceFailed(String),

    // Storage errors
    StorageError(String),

    // External service errors
    AnalystUnavailable,
    ExternalServiceError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg.clone()),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "Upload exceeds the size limit".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::UnprocessableImage(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Model unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Detection model is not loaded".to_string())
            }
            AppError::InferenceTimeout(secs) => {
                tracing::error!("Inference exceeded {}s", secs);
                (StatusCode::GATEWAY_TIMEOUT, format!("Inference timed out after {}s", secs))
            }
            AppError::InferenceFailed(msg) => {
                tracing::error!("Inference failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Inference failed".to_string())
            }
            AppError::StorageError(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error occurred".to_string())
            }
            AppError::AnalystUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                AnalystError::Disabled.to_string(),
            ),
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, format!("External service error: {}", msg))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::UnsupportedFile(msg) => AppError::UnsupportedMediaType(format!("Unsupported file type: {}", msg)),
            PipelineError::Decode(msg) => AppError::UnprocessableImage(format!("Could not decode image: {}", msg)),
            PipelineError::ModelUnavailable(msg) => AppError::ModelUnavailable(msg),
            PipelineError::InferenceTimeout(secs) => AppError::InferenceTimeout(secs),
            PipelineError::InferenceFailed(msg) => AppError::InferenceFailed(msg),
            PipelineError::Storage(msg) => AppError::StorageError(msg),
        }
    }
}

impl From<LogError> for AppError {
    fn from(err: LogError) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(scan_id) => AppError::NotFound(format!("Scan not found: {}", scan_id)),
            other => AppError::StorageError(other.to_string()),
        }
    }
}

impl From<AnalystError> for AppError {
    fn from(err: AnalystError) -> Self {
        match err {
            AnalystError::Disabled => AppError::AnalystUnavailable,
            other => AppError::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("Blocking task failed: {}", err))
    }
}
