//! API error types with structured JSON responses.
//!
//! The HTTP layer converts `EngineError` into `ApiError` and returns it
//! directly from handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::schedule::EngineError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Schedule does not fit: {0}")]
    ScheduleOverflow(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::ScheduleOverflow(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            ApiError::Validation(detail) => ("VALIDATION_FAILED", detail),
            ApiError::ScheduleOverflow(detail) => ("SCHEDULE_OVERFLOW", detail),
            ApiError::Forbidden(detail) => ("FORBIDDEN", detail),
            ApiError::NotFound(detail) => ("NOT_FOUND", detail),
            ApiError::Conflict(detail) => ("CONCURRENT_MODIFICATION", detail),
            ApiError::Unavailable(detail) => {
                tracing::error!(detail, "Store unavailable");
                ("STORE_UNAVAILABLE", "The medication store is unavailable".to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                ("INTERNAL", "An internal error occurred".to_string())
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::Validation(detail) => ApiError::Validation(detail),
            EngineError::ScheduleOverflow { .. } => ApiError::ScheduleOverflow(message),
            EngineError::Unauthorized { .. } => ApiError::Forbidden(message),
            EngineError::NotFound { .. } => ApiError::NotFound(message),
            EngineError::ConcurrentModification(_) => ApiError::Conflict(message),
            EngineError::Persistence(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match &err {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                ApiError::Unavailable(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
