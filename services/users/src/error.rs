//! Custom error types for the users service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

/// Custom error type for the users service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or incomplete request payload
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No live record with the requested identifier
    #[error("Record not found")]
    NotFound,

    /// The database could not be reached
    #[error("Service is unavailable")]
    Unavailable,

    /// A query or write failed; the message is safe to show to clients
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Map a storage error, using `context` as the client-facing message for
    /// query failures.
    pub fn database(err: &DatabaseError, context: &'static str) -> Self {
        if err.is_connection() {
            ApiError::Unavailable
        } else {
            ApiError::Internal(context)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Validation(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
