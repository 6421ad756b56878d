use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum TabloError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: i64 },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Missing or invalid console key")]
    Unauthorized,

    #[error("Database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

impl From<sqlx::Error> for TabloError {
    fn from(e: sqlx::Error) -> Self {
        let Some(db_err) = e.as_database_error() else {
            return TabloError::Database(e);
        };
        let message = db_err.message().to_string();
        match db_err.kind() {
            ErrorKind::UniqueViolation => TabloError::Conflict(message),
            ErrorKind::ForeignKeyViolation => TabloError::InvalidReference(message),
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                TabloError::Validation(message)
            }
            _ => TabloError::Database(e),
        }
    }
}

impl TabloError {
    pub fn status(&self) -> StatusCode {
        match self {
            TabloError::NotFound { .. } | TabloError::UnknownTable(_) => StatusCode::NOT_FOUND,
            TabloError::Validation(_) | TabloError::InvalidReference(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            TabloError::Conflict(_) => StatusCode::CONFLICT,
            TabloError::Unauthorized => StatusCode::UNAUTHORIZED,
            TabloError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE, // 503
            TabloError::Database(_) | TabloError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TabloError::NotFound { .. } => "NOT_FOUND",
            TabloError::UnknownTable(_) => "UNKNOWN_TABLE",
            TabloError::Validation(_) => "VALIDATION_FAILED",
            TabloError::InvalidReference(_) => "INVALID_REFERENCE",
            TabloError::Conflict(_) => "CONFLICT",
            TabloError::Unauthorized => "UNAUTHORIZED",
            TabloError::Unavailable(_) => "DATABASE_UNAVAILABLE",
            TabloError::Database(_) | TabloError::Json(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for TabloError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            TabloError::Database(_) | TabloError::Json(_) => {
                error!(error = %self, "request failed");
                "An internal server error occurred.".to_string()
            }
            TabloError::Unavailable(_) => {
                error!(error = %self, "database unreachable");
                "The database is not reachable.".to_string()
            }
            other => other.to_string(),
        };
        let body = ApiErrorBody {
            code: self.code().to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
