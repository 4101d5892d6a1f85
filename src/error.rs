// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 401 Unauthorized (missing or invalid credential)
    Unauthenticated(String),

    // 400 Bad Request (malformed candidate/test/question identifier)
    InvalidReference(String),

    // 404 Not Found (question id resolves to nothing in the catalog)
    QuestionNotFound(String),

    // 404 Not Found (any other missing resource)
    NotFound(String),

    // 400 Bad Request (schema-level rejection, required field missing)
    ValidationFailure(String),

    // 409 Conflict (duplicate username, mutating a finalized attempt)
    Conflict(String),

    // 500 Internal Server Error
    ServerFault(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::InvalidReference(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::QuestionNotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ValidationFailure(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServerFault(msg) => {
                tracing::error!("Server fault: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::ServerFault`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::ServerFault(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationFailure(err.to_string())
    }
}
