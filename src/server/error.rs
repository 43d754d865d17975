//! API Error Types
//!
//! One structured error body for every console endpoint. The taxonomy
//! follows how failures are handled: configuration and validation errors are
//! rejected locally before any network call, upstream failures carry the
//! engine's message verbatim, and nothing is retried automatically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::engine::EngineError;

/// Console API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid or missing session token")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Missing host/API key/collection before an action was attempted.
    /// Rejected locally, no network call is made.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A request body failed schema validation.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// The remote engine failed; see [`EngineError`] for the breakdown.
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Config(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Engine(EngineError::Config(_)) => StatusCode::BAD_REQUEST,
            ApiError::Engine(EngineError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Engine(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = serde_json::json!({ "error": self.to_string() });

        match &self {
            ApiError::Validation { field, .. } => {
                body["field"] = serde_json::json!(field);
            }
            ApiError::Engine(EngineError::Upstream {
                status: upstream, ..
            }) => {
                body["upstream_status"] = serde_json::json!(upstream);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
