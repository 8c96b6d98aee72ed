//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use folio_core::{JobError, LifecycleError, RepoError};
use folio_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest { code: &'static str, detail: String },
    Conflict { code: &'static str, detail: String },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {msg}"),
            AppError::BadRequest { detail, .. } => write!(f, "Bad request: {detail}"),
            AppError::Conflict { detail, .. } => write!(f, "Conflict: {detail}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail).with_code("not_found"),
            AppError::BadRequest { code, detail } => {
                ErrorResponse::bad_request(detail).with_code(*code)
            }
            AppError::Conflict { code, detail } => ErrorResponse::conflict(detail).with_code(*code),
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                ErrorResponse::internal_error().with_code("persistence_failure")
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let code = err.code();
        match err {
            LifecycleError::InvalidTransition { .. } => AppError::Conflict {
                code,
                detail: err.to_string(),
            },
            LifecycleError::InvalidTimestamp(_) => AppError::BadRequest {
                code,
                detail: err.to_string(),
            },
            LifecycleError::NotFound { .. } => AppError::NotFound(err.to_string()),
            LifecycleError::PersistenceFailure(repo) => repo.into(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(_) => AppError::NotFound(err.to_string()),
            JobError::InvalidCadence(_) => AppError::BadRequest {
                code: "invalid_cadence",
                detail: err.to_string(),
            },
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
