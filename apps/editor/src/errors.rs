use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::items::FieldError;
use crate::persistence::kv::StorageError;
use crate::persistence::transfer::TransferError;
use crate::polish::orchestrator::PolishError;
use crate::sections::staging::StagingError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StagingError> for AppError {
    fn from(e: StagingError) -> Self {
        match e {
            StagingError::NotStaged(_) | StagingError::ItemNotFound { .. } => {
                AppError::NotFound(e.to_string())
            }
            StagingError::TypeMismatch { .. } | StagingError::Field(_) => {
                AppError::Validation(e.to_string())
            }
        }
    }
}

impl From<FieldError> for AppError {
    fn from(e: FieldError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<TransferError> for AppError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Write { .. } => AppError::Internal(anyhow::Error::new(e)),
            other => AppError::Import(other.to_string()),
        }
    }
}

impl From<PolishError> for AppError {
    fn from(e: PolishError) -> Self {
        match e {
            PolishError::Busy | PolishError::StillStreaming | PolishError::NothingToAccept => {
                AppError::Conflict(e.to_string())
            }
            PolishError::TargetMissing(_) => AppError::NotFound(e.to_string()),
            PolishError::Unavailable => AppError::Unavailable(e.to_string()),
            PolishError::Staging(inner) => inner.into(),
            PolishError::NotText(_) | PolishError::Field(_) => AppError::Validation(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Import(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "IMPORT_FAILED",
                msg.clone(),
            ),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                msg.clone(),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
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
