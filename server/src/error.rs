//! API Error Types
//!
//! Every domain endpoint reports failures through [`ApiError`] so clients
//! see one stable set of machine-readable codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Domain error taxonomy shared by all endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or semantically invalid input.
    #[error("{0}")]
    Validation(String),

    /// The actor is authenticated but not allowed to perform the operation.
    #[error("{0}")]
    Authorization(String),

    /// The referenced entity does not exist (or is outside the actor's view).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The operation is not legal in the entity's current state.
    #[error("{0}")]
    InvalidState(String),

    /// Database error.
    #[error("Internal server error")]
    Database(#[from] sqlx::Error),

    /// Anything else that should never reach clients with detail attached.
    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Authorization(_) => (StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            Self::Database(err) => {
                tracing::error!(%err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            Self::Internal(detail) => {
                tracing::error!(detail, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        (
            status,
            Json(json!({ "error": code, "message": self.to_string() })),
        )
            .into_response()
    }
}

/// Result type for domain operations.
pub type ApiResult<T> = Result<T, ApiError>;
