//! Unified error handling for route handlers.
//!
//! All route handlers return `Result<T, AppError>`. Server-side failures are
//! logged with their details; clients only see a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use session_cart_core::{CartError, PersistenceError};
use thiserror::Error;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        Self::Cart(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Cart(CartError::Persistence(PersistenceError::BlobTooLarge { .. })) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Cart(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Cart(CartError::Persistence(PersistenceError::BlobTooLarge { .. })) => {
                "Cart is too large to store".to_string()
            }
            Self::Cart(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::BadRequest(_) => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
