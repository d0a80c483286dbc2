//! Persisted records: policy entries and profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{PolicyError, Result};
use crate::scope::Scope;

/// (profile, scope) -> action, with the time it was last decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub profile: String,
    pub scope: Scope,
    pub action: Action,
    pub updated_at: DateTime<Utc>,
}

impl PolicyEntry {
    pub fn new(
        profile: impl Into<String>,
        scope: Scope,
        action: Action,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            profile: profile.into(),
            scope,
            action,
            updated_at,
        }
    }

    /// Upsert key: profile name plus scope identity, both case-insensitive
    pub fn key(&self) -> String {
        entry_key(&self.profile, &self.scope)
    }

    pub fn validate(&self) -> Result<()> {
        Profile::validate_name(&self.profile)?;
        self.scope.validate()
    }
}

/// Separates the profile name from the scope identity in [`entry_key`]
pub const PROFILE_KEY_SEPARATOR: char = '/';

/// Key under which an entry for `scope` in `profile` is stored
///
/// Unambiguous for validated records: profile names never contain
/// [`PROFILE_KEY_SEPARATOR`] and app identifiers never contain the scope
/// separator.
pub fn entry_key(profile: &str, scope: &Scope) -> String {
    format!(
        "{}{}{}",
        profile.to_ascii_lowercase(),
        PROFILE_KEY_SEPARATOR,
        scope.key()
    )
}

/// A named, switchable set of policy entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            active: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn validate(&self) -> Result<()> {
        Self::validate_name(&self.name)
    }

    /// Profile names must be non-blank and free of the key separator
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(PolicyError::malformed("profile name is empty"));
        }
        if name.contains(PROFILE_KEY_SEPARATOR) {
            return Err(PolicyError::malformed(format!(
                "profile name {name:?} contains '{PROFILE_KEY_SEPARATOR}'"
            )));
        }
        Ok(())
    }
}
