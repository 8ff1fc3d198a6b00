// for error definitions
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Errors surfaced by the cache write path
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request input, e.g. a non-numeric query parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unexpected or internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Cache backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backend actively refused the TCP connection
    #[error("Cache connection refused: {0}")]
    ConnectionRefused(String),

    /// Any other connection-level failure (I/O, dropped connection)
    #[error("Cache connection error: {0}")]
    Connection(String),

    // Redis authentication errors
    #[error("Cache authentication error: {0}")]
    Auth(String),

    /// Command errors reported by the backend
    #[error("Cache command error: {0}")]
    Command(String),

    /// The backend did not answer within the configured timeout
    #[error("Cache operation timed out: {0}")]
    Timeout(String),

    /// The client has been shut down
    #[error("Cache client closed")]
    Closed,
}

impl CacheError {
    /// True when the backend could not even be reached.
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, CacheError::ConnectionRefused(_))
    }
}

// Classify redis::RedisError into CacheError
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() {
            return CacheError::ConnectionRefused(err.to_string());
        }
        if err.is_timeout() {
            return CacheError::Timeout(err.to_string());
        }

        match err.kind() {
            redis::ErrorKind::AuthenticationFailed => CacheError::Auth(err.to_string()),
            redis::ErrorKind::IoError | redis::ErrorKind::ClientError => {
                CacheError::Connection(err.to_string())
            }
            _ if err.is_connection_dropped() => CacheError::Connection(err.to_string()),
            _ => CacheError::Command(err.to_string()),
        }
    }
}

// Every handler failure is answered with a 500 and a uniform `{error}` body.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match &self {
            ServiceError::InvalidParameter(_) => tracing::warn!(error = %self, "Request rejected"),
            _ => tracing::error!(error = %self, "Request failed"),
        }

        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// define a Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServiceError>;
