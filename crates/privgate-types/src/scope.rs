//! Scope tuples: what a policy decision applies to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{PolicyError, Result};
use crate::taxonomy::{LibraryCategory, PermissionKind, Purpose, Taxonomy, ThirdPartyLibrary};

/// Wire form of the "every app" wildcard
pub const APP_ALL: &str = "*";

/// Separates the four fields of [`Scope::key`]
pub const SCOPE_KEY_SEPARATOR: char = ':';

/// The app a scope applies to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppTarget {
    /// Every app
    All,
    /// A literal package identifier
    Package(String),
}

impl AppTarget {
    pub fn package(name: impl Into<String>) -> Self {
        AppTarget::Package(name.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, AppTarget::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            AppTarget::All => APP_ALL,
            AppTarget::Package(name) => name,
        }
    }

    /// Whether this target names `package` literally (case-insensitive)
    pub fn is_package(&self, package: &str) -> bool {
        match self {
            AppTarget::All => false,
            AppTarget::Package(name) => name.eq_ignore_ascii_case(package),
        }
    }
}

impl From<String> for AppTarget {
    fn from(value: String) -> Self {
        if value.trim() == APP_ALL {
            AppTarget::All
        } else {
            AppTarget::Package(value)
        }
    }
}

impl From<AppTarget> for String {
    fn from(value: AppTarget) -> Self {
        value.as_str().to_string()
    }
}

impl PartialEq for AppTarget {
    fn eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl Eq for AppTarget {}

impl fmt::Display for AppTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (app, permission, purpose, library)
///
/// Identity is the case-insensitive concatenation of the four fields, see
/// [`Scope::key`]. That identity is an upsert key only; it does not encode
/// which scopes are more specific than others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub app: AppTarget,
    pub permission: PermissionKind,
    pub purpose: Purpose,
    pub library: ThirdPartyLibrary,
}

impl Scope {
    pub fn new(
        app: AppTarget,
        permission: PermissionKind,
        purpose: Purpose,
        library: ThirdPartyLibrary,
    ) -> Self {
        Self {
            app,
            permission,
            purpose,
            library,
        }
    }

    /// Case-insensitive identity string
    pub fn key(&self) -> String {
        let sep = SCOPE_KEY_SEPARATOR;
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.app.as_str(),
            self.permission.name(),
            self.purpose.name(),
            self.library.id()
        )
        .to_ascii_lowercase()
    }

    pub fn with_app(&self, app: AppTarget) -> Self {
        Self {
            app,
            ..self.clone()
        }
    }

    pub fn with_purpose(&self, purpose: Purpose) -> Self {
        Self {
            purpose,
            ..self.clone()
        }
    }

    pub fn with_library(&self, library: ThirdPartyLibrary) -> Self {
        Self {
            library,
            ..self.clone()
        }
    }

    /// Reject scopes that cannot be persisted
    pub fn validate(&self) -> Result<()> {
        if let AppTarget::Package(name) = &self.app {
            if name.trim().is_empty() {
                return Err(PolicyError::malformed("scope has an empty app identifier"));
            }
            if name.contains(SCOPE_KEY_SEPARATOR) {
                return Err(PolicyError::malformed(format!(
                    "app identifier {name:?} contains '{SCOPE_KEY_SEPARATOR}'"
                )));
            }
        }
        if self.permission.name().trim().is_empty() {
            return Err(PolicyError::malformed("scope has an empty permission"));
        }
        if self.purpose.name().trim().is_empty() {
            return Err(PolicyError::malformed("scope has an empty purpose"));
        }
        Ok(())
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.app, self.permission, self.purpose, self.library
        )
    }
}

/// Unvalidated scope as submitted from outside
///
/// `app` must be present (use `*` for every app), as must `permission` and
/// `purpose`. An omitted library means the wildcard library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDraft {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub library: Option<String>,
}

impl ScopeDraft {
    pub fn new(app: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            app: Some(app.into()),
            permission: Some(permission.into()),
            ..Default::default()
        }
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Validate against the taxonomy
    ///
    /// Missing fields fail with `MalformedPolicy`; unregistered names fail
    /// with `UnknownTaxonomyValue`.
    pub fn build(&self, taxonomy: &Taxonomy) -> Result<Scope> {
        let app = non_blank(&self.app).ok_or_else(|| PolicyError::malformed("missing app"))?;
        let permission = non_blank(&self.permission)
            .ok_or_else(|| PolicyError::malformed("missing permission"))?;
        let purpose =
            non_blank(&self.purpose).ok_or_else(|| PolicyError::malformed("missing purpose"))?;

        let permission = taxonomy.permission(permission)?.clone();
        let purpose = taxonomy.purpose(purpose)?.clone();
        let library = match non_blank(&self.library) {
            Some(name) => canonical_library(taxonomy, name)?,
            None => taxonomy.all_library().clone(),
        };

        let scope = Scope::new(AppTarget::from(app.to_string()), permission, purpose, library);
        scope.validate()?;
        Ok(scope)
    }
}

/// Stored scopes never name the app-internal marker; app-internal code is
/// covered by the wildcard library.
fn canonical_library(taxonomy: &Taxonomy, name: &str) -> Result<ThirdPartyLibrary> {
    let library = taxonomy.library(name)?;
    if library.category() == Some(LibraryCategory::AppInternal) {
        return Ok(taxonomy.all_library().clone());
    }
    Ok(library.clone())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_case_insensitive() {
        let taxonomy = Taxonomy::standard();
        let a = ScopeDraft::new("com.Example.App", "camera")
            .purpose("analytics")
            .build(&taxonomy)
            .unwrap();
        let b = ScopeDraft::new("com.example.app", "CAMERA")
            .purpose("ANALYTICS")
            .library("all")
            .build(&taxonomy)
            .unwrap();
        assert_eq!(a.key(), "com.example.app:camera:analytics:all");
        assert_eq!(a, b);
    }

    #[test]
    fn wildcard_app_round_trips_as_star() {
        let json = serde_json::to_string(&AppTarget::All).unwrap();
        assert_eq!(json, "\"*\"");
        let app: AppTarget = serde_json::from_str("\"*\"").unwrap();
        assert!(app.is_all());
    }

    #[test]
    fn missing_fields_are_malformed() {
        let taxonomy = Taxonomy::standard();
        let missing_purpose = ScopeDraft::new("com.example.app", "CAMERA");
        assert!(matches!(
            missing_purpose.build(&taxonomy),
            Err(PolicyError::MalformedPolicy(_))
        ));

        let blank_app = ScopeDraft::new("  ", "CAMERA").purpose("ALL");
        assert!(matches!(
            blank_app.build(&taxonomy),
            Err(PolicyError::MalformedPolicy(_))
        ));
    }

    #[test]
    fn unknown_names_fail_fast() {
        let taxonomy = Taxonomy::standard();
        let draft = ScopeDraft::new("*", "CAMERA").purpose("MIND_READING");
        assert!(matches!(
            draft.build(&taxonomy),
            Err(PolicyError::UnknownTaxonomyValue { .. })
        ));
    }

    #[test]
    fn app_internal_library_maps_to_wildcard() {
        let taxonomy = Taxonomy::standard();
        let scope = ScopeDraft::new("A", "CAMERA")
            .purpose("RUNNING_OTHER_FEATURES")
            .library("APP_INTERNAL")
            .build(&taxonomy)
            .unwrap();
        assert!(scope.library.is_all());
    }
}
