//! Error types for the RAG pipeline and server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline and server errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding contract failure (bad response shape, count mismatch)
    #[error("embedding generation failed: {0}")]
    Embedding(String),

    /// Completion contract failure (bad response shape, empty choices)
    #[error("completion failed: {0}")]
    Completion(String),

    /// Provider call did not return within the configured timeout
    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider rate limit (HTTP 429)
    #[error("provider rate limited: {0}")]
    RateLimited(String),

    /// Non-success status from the provider
    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP transport error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Vector dimensionality mismatch
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// No persisted index at the expected location
    #[error("no index found at {}", .0.display())]
    IndexNotFound(PathBuf),

    /// Persisted index exists but cannot be decoded
    #[error("corrupt index data: {0}")]
    CorruptIndex(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a completion error
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry with backoff may succeed.
    ///
    /// Timeouts, rate limits, 5xx responses, and transport failures are
    /// transient; everything else (auth failures, invalid requests,
    /// consistency errors) is terminal and propagates immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::FileParse { filename, message } => (
                StatusCode::BAD_REQUEST,
                "parse_error",
                format!("failed to parse '{}': {}", filename, message),
            ),
            Error::UnsupportedFileType(ext) => (
                StatusCode::BAD_REQUEST,
                "unsupported_type",
                format!("unsupported file type: {}", ext),
            ),
            Error::Embedding(msg) => (StatusCode::BAD_GATEWAY, "embedding_error", msg.clone()),
            Error::Completion(msg) => (StatusCode::BAD_GATEWAY, "completion_error", msg.clone()),
            Error::Timeout(d) => (
                StatusCode::GATEWAY_TIMEOUT,
                "provider_timeout",
                format!("provider request timed out after {:?}", d),
            ),
            Error::RateLimited(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited", msg.clone())
            }
            Error::Api { status, message } => (
                StatusCode::BAD_GATEWAY,
                "provider_error",
                format!("provider returned HTTP {}: {}", status, message),
            ),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::DimensionMismatch { expected, actual } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "dimension_mismatch",
                format!("expected {} dimensions, got {}", expected, actual),
            ),
            Error::IndexNotFound(path) => (
                StatusCode::NOT_FOUND,
                "index_not_found",
                format!("no index found at {}", path.display()),
            ),
            Error::CorruptIndex(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_index", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(Error::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(Error::RateLimited("slow down".into()).is_retryable());
        assert!(Error::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());

        assert!(!Error::Api {
            status: 401,
            message: "bad key".into()
        }
        .is_retryable());
        assert!(!Error::Embedding("wrong vector count".into()).is_retryable());
        assert!(!Error::DimensionMismatch {
            expected: 768,
            actual: 384
        }
        .is_retryable());
        assert!(!Error::CorruptIndex("truncated".into()).is_retryable());
    }
}
