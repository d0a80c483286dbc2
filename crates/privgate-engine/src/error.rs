//! Engine error types

use privgate_store::StoreError;
use privgate_types::PolicyError;
use thiserror::Error;

/// Errors surfaced by the engine, profile manager and mediator
#[derive(Debug, Error)]
pub enum EngineError {
    /// Unknown taxonomy value or malformed policy
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Policy store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// A decision that cannot be recorded with the requested durability
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The consent collaborator did not produce an answer
    #[error("Consent prompt failed: {0}")]
    Prompt(String),

    #[error("No pending prompt with id {0}")]
    PromptNotFound(uuid::Uuid),
}

impl EngineError {
    /// Store errors with a profile-specific meaning are lifted to engine
    /// variants; everything else is wrapped as-is.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::ProfileNotFound(name) => Self::ProfileNotFound(name),
            other => Self::Store(other),
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
