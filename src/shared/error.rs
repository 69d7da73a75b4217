//! Engine Error Taxonomy
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Chat engine error type.
///
/// Validation, permission, rate-limit and not-found errors are returned
/// synchronously to the requesting connection only; they are never broadcast
/// to other channel members.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl ChatError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ChatError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ChatError::Validation(msg) => (StatusCode::BAD_REQUEST, 10002, msg.clone()),
            ChatError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, 10003, msg.clone()),
            ChatError::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, 10004, "Rate limited".into())
            }
            ChatError::NotFound(msg) => (StatusCode::NOT_FOUND, 10001, msg.clone()),
            ChatError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    10000,
                    "Internal server error".into(),
                )
            }
        };

        let body = ErrorResponse { code, message };

        (status, Json(body)).into_response()
    }
}
