//! Engine Client Error Types
//!
//! Error handling for calls to the remote search engine.

use thiserror::Error;

/// Errors from the remote search engine client.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The connection profile is unusable; rejected before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine answered with a non-success status. The message is the
    /// engine's response body, surfaced verbatim.
    #[error("Engine returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The request exceeded the client timeout. Retryable by re-submitting;
    /// never retried automatically.
    #[error("Request to the search engine timed out")]
    Timeout,

    /// Network-level failure (connection refused, DNS, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The engine answered 2xx but the body did not decode.
    #[error("Failed to decode engine response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::Timeout
        } else if e.is_decode() {
            EngineError::Decode(e.to_string())
        } else {
            EngineError::Transport(e.to_string())
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
