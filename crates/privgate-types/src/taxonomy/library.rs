//! Code origins: third-party vendors and the app itself

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical id of the wildcard library
pub const LIBRARY_ALL: &str = "ALL";
/// Canonical id of the app-internal category library
pub const LIBRARY_APP_INTERNAL: &str = "APP_INTERNAL";
/// Canonical id of the third-party category library
pub const LIBRARY_THIRD_PARTY: &str = "THIRD_PARTY_USE";

/// Top-level split of code origins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryCategory {
    AppInternal,
    ThirdParty,
}

impl LibraryCategory {
    /// Id of the pseudo-library standing for every library in this category
    pub fn marker_id(&self) -> &'static str {
        match self {
            LibraryCategory::AppInternal => LIBRARY_APP_INTERNAL,
            LibraryCategory::ThirdParty => LIBRARY_THIRD_PARTY,
        }
    }

    /// Parse a category marker id (case-insensitive)
    pub fn from_marker(id: &str) -> Option<Self> {
        if id.eq_ignore_ascii_case(LIBRARY_APP_INTERNAL) {
            Some(LibraryCategory::AppInternal)
        } else if id.eq_ignore_ascii_case(LIBRARY_THIRD_PARTY) {
            Some(LibraryCategory::ThirdParty)
        } else {
            None
        }
    }
}

impl fmt::Display for LibraryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker_id())
    }
}

/// The code origin responsible for an access
///
/// Vendor libraries carry a qualified identifier (a package prefix such as
/// `com.flurry`) that is matched against code origins. Equality is by
/// canonical identifier only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThirdPartyLibrary {
    id: String,
    display_name: String,
    /// `None` only for the wildcard library
    category: Option<LibraryCategory>,
    default_purpose: String,
}

impl ThirdPartyLibrary {
    /// A vendor library identified by its qualified package prefix
    pub fn vendor(
        id: impl Into<String>,
        display_name: impl Into<String>,
        default_purpose: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category: Some(LibraryCategory::ThirdParty),
            default_purpose: default_purpose.into(),
        }
    }

    /// The pseudo-library for a whole category
    pub fn category_marker(category: LibraryCategory, default_purpose: impl Into<String>) -> Self {
        let display_name = match category {
            LibraryCategory::AppInternal => "App internal use",
            LibraryCategory::ThirdParty => "Third-party use",
        };
        Self {
            id: category.marker_id().to_string(),
            display_name: display_name.to_string(),
            category: Some(category),
            default_purpose: default_purpose.into(),
        }
    }

    /// The wildcard library
    pub fn all() -> Self {
        Self {
            id: LIBRARY_ALL.to_string(),
            display_name: "Any library".to_string(),
            category: None,
            default_purpose: super::purpose::PURPOSE_ALL.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> Option<LibraryCategory> {
        self.category
    }

    pub fn default_purpose(&self) -> &str {
        &self.default_purpose
    }

    pub fn is_all(&self) -> bool {
        self.id.eq_ignore_ascii_case(LIBRARY_ALL)
    }

    pub fn is_category_marker(&self) -> bool {
        LibraryCategory::from_marker(&self.id).is_some()
    }

    /// A concrete vendor, i.e. neither the wildcard nor a category marker
    pub fn is_vendor(&self) -> bool {
        !self.is_all() && !self.is_category_marker()
    }

    /// Whether this vendor's qualified identifier occurs inside `origin`
    pub fn matches_origin(&self, origin: &str) -> bool {
        self.is_vendor() && origin.to_ascii_lowercase().contains(&self.id.to_ascii_lowercase())
    }
}

impl PartialEq for ThirdPartyLibrary {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id)
    }
}

impl Eq for ThirdPartyLibrary {}

impl Hash for ThirdPartyLibrary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for ThirdPartyLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
