//! Permission kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// How sensitive the guarded data is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

/// Platform protection tier of the underlying permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionTier {
    Normal,
    Dangerous,
    Signature,
}

/// A category of sensitive data, e.g. location or contacts
///
/// Identity is the canonical name alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionKind {
    name: String,
    display_name: String,
    sensitivity: Sensitivity,
    tier: ProtectionTier,
}

impl PermissionKind {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        sensitivity: Sensitivity,
        tier: ProtectionTier,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            sensitivity,
            tier,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    pub fn tier(&self) -> ProtectionTier {
        self.tier
    }
}

impl PartialEq for PermissionKind {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for PermissionKind {}

impl Hash for PermissionKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
