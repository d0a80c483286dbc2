//! Error types for taxonomy lookups and policy validation

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Registry a taxonomy lookup was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Permission,
    Purpose,
    Library,
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyKind::Permission => write!(f, "permission"),
            TaxonomyKind::Purpose => write!(f, "purpose"),
            TaxonomyKind::Library => write!(f, "library"),
        }
    }
}

/// Errors raised while building scopes and validating policy records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Unknown {kind} taxonomy value: {name}")]
    UnknownTaxonomyValue { kind: TaxonomyKind, name: String },

    #[error("Duplicate {kind} registration: {name}")]
    DuplicateRegistration { kind: TaxonomyKind, name: String },

    #[error("Malformed policy: {0}")]
    MalformedPolicy(String),
}

impl PolicyError {
    pub fn unknown(kind: TaxonomyKind, name: impl Into<String>) -> Self {
        Self::UnknownTaxonomyValue {
            kind,
            name: name.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPolicy(reason.into())
    }
}

/// Result type for type-level operations
pub type Result<T> = std::result::Result<T, PolicyError>;
