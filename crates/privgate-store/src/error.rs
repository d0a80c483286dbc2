//! Store error types

use thiserror::Error;

/// Policy store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Profile already exists: {0}")]
    ProfileAlreadyExists(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Store unavailable")]
    Unavailable,
}

impl StoreError {
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
