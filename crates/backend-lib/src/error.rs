//! Central error type + Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationError;

/// Application error types with error codes and context.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("room not found: {room_code}")]
    RoomNotFound { room_code: String },

    #[error("chair access required for this operation")]
    ChairAccessDenied { room_code: String, session_id: Uuid },

    #[error("chair role is already occupied")]
    ChairOccupied { room_code: String },

    #[error("room code space exhausted")]
    CodesExhausted,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::RoomNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ChairAccessDenied { .. } => StatusCode::FORBIDDEN,
            AppError::ChairOccupied { .. } => StatusCode::CONFLICT,
            AppError::CodesExhausted => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Json(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, also used in error envelopes.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::RoomNotFound { .. } => "ROOM_NOT_FOUND",
            AppError::ChairAccessDenied { .. } => "CHAIR_ACCESS_DENIED",
            AppError::ChairOccupied { .. } => "CHAIR_OCCUPIED",
            AppError::CodesExhausted => "ROOM_CODES_EXHAUSTED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AppError::Internal("failed to send message".to_string())
    }
}
