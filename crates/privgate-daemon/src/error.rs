//! Error types for privgate-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use privgate_engine::EngineError;
use privgate_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Engine start-up failed
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Policy(_)
            | EngineError::InvalidDecision(_)
            | EngineError::InvalidRequest(_) => ApiError::BadRequest(err.to_string()),
            EngineError::ProfileNotFound(_) | EngineError::PromptNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            EngineError::Store(StoreError::ProfileAlreadyExists(_)) => {
                ApiError::Conflict(err.to_string())
            }
            EngineError::Store(StoreError::InvalidRecord(_)) => {
                ApiError::BadRequest(err.to_string())
            }
            EngineError::Store(_) | EngineError::Prompt(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;
    use privgate_types::{PolicyError, TaxonomyKind};

    #[test]
    fn test_engine_errors_map_to_status_codes() {
        let unknown = EngineError::Policy(PolicyError::unknown(TaxonomyKind::Purpose, "X"));
        assert_eq!(
            ApiError::from(unknown).into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let missing = EngineError::ProfileNotFound("Work".into());
        assert_eq!(
            ApiError::from(missing).into_response().status(),
            StatusCode::NOT_FOUND
        );

        let duplicate = EngineError::Store(StoreError::ProfileAlreadyExists("Work".into()));
        assert_eq!(
            ApiError::from(duplicate).into_response().status(),
            StatusCode::CONFLICT
        );

        let io = EngineError::Store(StoreError::io("disk full"));
        assert_eq!(
            ApiError::from(io).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
