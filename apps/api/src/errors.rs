use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Source(msg) => {
                tracing::error!("Source error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SOURCE_ERROR",
                    "Failed to read CVs from the configured source".to_string(),
                )
            }
            AppError::Timeout(msg) => {
                tracing::warn!("Upstream timeout: {msg}");
                (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
