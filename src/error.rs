/// Core error taxonomy and its HTTP mapping
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::db::DbError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed password or stored hash. Not a security event.
    #[error("Malformed credential: {0}")]
    CredentialFormat(String),

    #[error("Invalid credentials")]
    CredentialMismatch,

    /// Expired, tampered and malformed tokens all end up here.
    #[error("Invalid or expired session")]
    TokenInvalid,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Attendance record is already checked out")]
    AlreadyCheckedOut,

    #[error("Attendance record not found")]
    RecordNotFound,

    /// Pool exhaustion, timeout or lost connection. Retryable.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Unexpected constraint violation: {0}")]
    StorageConstraintViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind, sent as the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::CredentialFormat(_) => "credential_format_error",
            AppError::CredentialMismatch => "credential_mismatch",
            AppError::TokenInvalid => "token_invalid",
            AppError::Forbidden(_) => "forbidden",
            AppError::AlreadyCheckedIn => "already_checked_in",
            AppError::AlreadyCheckedOut => "already_checked_out",
            AppError::RecordNotFound => "record_not_found",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::StorageConstraintViolation(_) => "internal_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Unavailable { .. } => AppError::StorageUnavailable(err.to_string()),
            DbError::Duplicate { .. } | DbError::Constraint { .. } => {
                AppError::StorageConstraintViolation(err.to_string())
            }
            DbError::Internal { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::CredentialFormat(_)
            | AppError::AlreadyCheckedIn
            | AppError::AlreadyCheckedOut
            | AppError::RecordNotFound => StatusCode::BAD_REQUEST,
            AppError::CredentialMismatch | AppError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StorageConstraintViolation(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::StorageUnavailable(detail) => {
                tracing::warn!(error = %detail, "Storage unavailable");
                "Service temporarily unavailable, retry later".to_string()
            }
            AppError::StorageConstraintViolation(detail) | AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal fault");
                "Internal Server Error".to_string()
            }
            AppError::CredentialFormat(_) => "Malformed credentials".to_string(),
            other => other.to_string(),
        };

        let mut builder = HttpResponse::build(self.status_code());
        if self.is_retryable() {
            builder.insert_header(("Retry-After", "1"));
        }
        builder.json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}
