//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Authentication and role-resolution error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid or malformed token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Missing Authorization header.
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    /// The token names a citizen this service does not know.
    #[error("Unknown citizen account")]
    UnknownCitizen,

    /// The caller lacks the role this surface requires.
    #[error("{0} role required")]
    RoleRequired(&'static str),

    /// The administrator has no department assigned.
    #[error("Administrator is not assigned to a department")]
    DepartmentUnassigned,

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// Internal server error.
    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "MISSING_AUTH"),
            Self::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            Self::UnknownCitizen => (StatusCode::UNAUTHORIZED, "UNKNOWN_CITIZEN"),
            Self::RoleRequired(_) => (StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR"),
            Self::DepartmentUnassigned => (StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR"),
            Self::Database(err) => {
                tracing::error!(%err, "Auth database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        (
            status,
            Json(json!({ "error": code, "message": self.to_string() })),
        )
            .into_response()
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
