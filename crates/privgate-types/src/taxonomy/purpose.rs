//! Access purposes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical name of the wildcard purpose
pub const PURPOSE_ALL: &str = "ALL";

/// Reason code for an access (advertising, analytics, navigation, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purpose {
    name: String,
    description: String,
}

impl Purpose {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// The wildcard purpose
    pub fn all() -> Self {
        Self::new(PURPOSE_ALL, "Any purpose")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_all(&self) -> bool {
        self.name.eq_ignore_ascii_case(PURPOSE_ALL)
    }
}

impl PartialEq for Purpose {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for Purpose {}

impl Hash for Purpose {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
