//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

/// Interceptor endpoint errors with HTTP status code mapping
///
/// Only transport-level problems are reported this way. A request that
/// reaches an interceptor always gets `200 OK`; rejections travel inside the
/// response body as `continue = false` with a status.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Body is not a valid interceptor request
    ///
    /// Maps to: `400 Bad Request`
    #[error("Invalid interceptor request: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// No interceptor is registered under the path segment
    ///
    /// Maps to: `404 Not Found`
    #[error("Interceptor not found: {provider}")]
    ProviderNotFound { provider: String },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidBody(ref e) => {
                warn!(error = %e, "Rejecting malformed interceptor request");
                StatusCode::BAD_REQUEST
            }
            Self::ProviderNotFound { ref provider } => {
                warn!(provider = %provider, "Interceptor not found");
                StatusCode::NOT_FOUND
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code for the binary
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Unknown interceptor {name}; expected one of {known:?}")]
    UnknownInterceptor { name: String, known: Vec<String> },
}
