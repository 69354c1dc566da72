//! API error handling
//!
//! Every failure of the authentication core is an [`AuthError`]. Validation
//! and state-machine failures map to 4xx responses; storage and signing
//! failures map to 500.

use crate::auth::jwt::JwtError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ecomm_core::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Authentication, session and authorization errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Session has been revoked")]
    SessionRevoked,

    #[error("Session has expired")]
    SessionExpired,

    #[error("Refresh token does not match the session")]
    TokenMismatch,

    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for every request rejected at the gate for lack of a usable token
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader | AuthError::InvalidToken(_)
        )
    }

    /// HTTP status and stable error code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AuthError::SessionRevoked => (StatusCode::UNAUTHORIZED, "SESSION_REVOKED"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED"),
            AuthError::TokenMismatch => (StatusCode::UNAUTHORIZED, "TOKEN_MISMATCH"),
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AuthError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AuthError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AuthError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AuthError::NotFound(what),
            StoreError::Conflict(msg) => AuthError::Conflict(msg),
            StoreError::Database(msg) => AuthError::Store(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let error = match &self {
            // Internal details stay in the logs.
            AuthError::Store(msg) | AuthError::Internal(msg) => {
                tracing::error!(code, error = %msg, "request failed");
                ApiError::new(code, "Internal server error")
            }
            AuthError::InvalidToken(e) => {
                ApiError::new(code, "Invalid or expired token").with_details(e.to_string())
            }
            other => ApiError::new(code, other.to_string()),
        };

        (status, Json(error)).into_response()
    }
}
