use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::validation::FieldErrors;

/// RepositoryError
///
/// Failures surfaced by the persistence layer. Unique-index violations are lifted
/// out of the driver error so the handlers can report them as validation failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unique constraint violated on `{field}`")]
    Conflict { field: &'static str },
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// ApiError
///
/// Every failure a handler can return. Each variant maps onto one status code and
/// renders the `{message, errors?}` JSON envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: FieldErrors,
    },
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leave the process.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthenticated => "Unauthenticated.",
            ApiError::InvalidCredentials => "Invalid credentials",
            ApiError::Validation { message, .. } => message,
            ApiError::NotFound(message) | ApiError::BadRequest(message) => message,
            ApiError::PayloadTooLarge => "Payload Too Large",
            ApiError::Internal(_) => "Server Error",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Validation { message, errors } => json!({
                "message": message,
                "errors": errors,
            }),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Unhandled server error");
                json!({ "message": self.message() })
            }
            _ => json!({ "message": self.message() }),
        };

        (status, Json(body)).into_response()
    }
}
