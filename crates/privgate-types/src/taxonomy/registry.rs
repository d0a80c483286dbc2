//! Immutable lookup tables for the taxonomy
//!
//! A [`Taxonomy`] is built once at start-up through [`TaxonomyBuilder`] and
//! shared by reference. Nothing here is mutable after `build()`.

use std::collections::HashMap;

use crate::error::{PolicyError, Result, TaxonomyKind};

use super::library::{LibraryCategory, ThirdPartyLibrary, LIBRARY_ALL};
use super::permission::PermissionKind;
use super::purpose::{Purpose, PURPOSE_ALL};

/// Entries that can live in a [`Registry`]
pub trait Registered: Clone {
    const KIND: TaxonomyKind;

    fn canonical_name(&self) -> &str;
}

impl Registered for PermissionKind {
    const KIND: TaxonomyKind = TaxonomyKind::Permission;

    fn canonical_name(&self) -> &str {
        self.name()
    }
}

impl Registered for Purpose {
    const KIND: TaxonomyKind = TaxonomyKind::Purpose;

    fn canonical_name(&self) -> &str {
        self.name()
    }
}

impl Registered for ThirdPartyLibrary {
    const KIND: TaxonomyKind = TaxonomyKind::Library;

    fn canonical_name(&self) -> &str {
        self.id()
    }
}

/// Registration-ordered table with case-insensitive name lookup
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<T>,
    by_name: HashMap<String, usize>,
}

impl<T: Registered> Registry<T> {
    fn build(entries: Vec<T>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let key = entry.canonical_name().to_ascii_lowercase();
            if by_name.insert(key, index).is_some() {
                return Err(PolicyError::DuplicateRegistration {
                    kind: T::KIND,
                    name: entry.canonical_name().to_string(),
                });
            }
        }
        Ok(Self { entries, by_name })
    }

    /// Canonical instance for `name`, or `UnknownTaxonomyValue`
    pub fn from(&self, name: &str) -> Result<&T> {
        self.by_name
            .get(&name.trim().to_ascii_lowercase())
            .map(|&index| &self.entries[index])
            .ok_or_else(|| PolicyError::unknown(T::KIND, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.trim().to_ascii_lowercase())
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The three taxonomy registries, bundled
#[derive(Debug, Clone)]
pub struct Taxonomy {
    permissions: Registry<PermissionKind>,
    purposes: Registry<Purpose>,
    libraries: Registry<ThirdPartyLibrary>,
}

impl Taxonomy {
    pub fn builder() -> TaxonomyBuilder {
        TaxonomyBuilder::new()
    }

    pub fn permissions(&self) -> &Registry<PermissionKind> {
        &self.permissions
    }

    pub fn purposes(&self) -> &Registry<Purpose> {
        &self.purposes
    }

    pub fn libraries(&self) -> &Registry<ThirdPartyLibrary> {
        &self.libraries
    }

    pub fn permission(&self, name: &str) -> Result<&PermissionKind> {
        self.permissions.from(name)
    }

    pub fn purpose(&self, name: &str) -> Result<&Purpose> {
        self.purposes.from(name)
    }

    pub fn library(&self, name: &str) -> Result<&ThirdPartyLibrary> {
        self.libraries.from(name)
    }

    /// The wildcard purpose
    pub fn all_purpose(&self) -> &Purpose {
        self.purposes
            .from(PURPOSE_ALL)
            .expect("builder always registers the wildcard purpose")
    }

    /// The wildcard library
    pub fn all_library(&self) -> &ThirdPartyLibrary {
        self.libraries
            .from(LIBRARY_ALL)
            .expect("builder always registers the wildcard library")
    }

    /// The pseudo-library standing for a whole category
    pub fn category_library(&self, category: LibraryCategory) -> &ThirdPartyLibrary {
        self.libraries
            .from(category.marker_id())
            .expect("builder always registers both category libraries")
    }

    /// First registered vendor whose qualified identifier occurs in `origin`
    ///
    /// Registration order decides ambiguous matches, not match length.
    pub fn lookup_by_code_origin(&self, origin: &str) -> Option<&ThirdPartyLibrary> {
        self.libraries.iter().find(|lib| lib.matches_origin(origin))
    }

    /// Map a raw library name, category name or code origin to a category
    ///
    /// Unrecognised strings are treated as the app's own code.
    pub fn classify(&self, name_or_category: &str) -> LibraryCategory {
        if let Some(category) = LibraryCategory::from_marker(name_or_category.trim()) {
            return category;
        }
        if let Ok(library) = self.libraries.from(name_or_category) {
            return library.category().unwrap_or(LibraryCategory::AppInternal);
        }
        match self.lookup_by_code_origin(name_or_category) {
            Some(_) => LibraryCategory::ThirdParty,
            None => LibraryCategory::AppInternal,
        }
    }
}

/// Collects registrations; duplicate names are reported by `build()`
#[derive(Debug, Clone)]
pub struct TaxonomyBuilder {
    permissions: Vec<PermissionKind>,
    purposes: Vec<Purpose>,
    libraries: Vec<ThirdPartyLibrary>,
}

impl TaxonomyBuilder {
    /// Starts with the wildcard purpose, the wildcard library and both
    /// category libraries already registered.
    pub fn new() -> Self {
        Self {
            permissions: Vec::new(),
            purposes: vec![Purpose::all()],
            libraries: vec![
                ThirdPartyLibrary::all(),
                ThirdPartyLibrary::category_marker(LibraryCategory::AppInternal, PURPOSE_ALL),
                ThirdPartyLibrary::category_marker(LibraryCategory::ThirdParty, PURPOSE_ALL),
            ],
        }
    }

    pub fn permission(mut self, permission: PermissionKind) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn purpose(mut self, purpose: Purpose) -> Self {
        self.purposes.push(purpose);
        self
    }

    pub fn library(mut self, library: ThirdPartyLibrary) -> Self {
        self.libraries.push(library);
        self
    }

    pub fn build(self) -> Result<Taxonomy> {
        let purposes = Registry::build(self.purposes)?;
        for library in &self.libraries {
            if !purposes.contains(library.default_purpose()) {
                return Err(PolicyError::unknown(
                    TaxonomyKind::Purpose,
                    library.default_purpose(),
                ));
            }
        }
        Ok(Taxonomy {
            permissions: Registry::build(self.permissions)?,
            purposes,
            libraries: Registry::build(self.libraries)?,
        })
    }
}

impl Default for TaxonomyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{ProtectionTier, Sensitivity};

    fn small() -> Taxonomy {
        Taxonomy::builder()
            .permission(PermissionKind::new(
                "CAMERA",
                "Camera",
                Sensitivity::High,
                ProtectionTier::Dangerous,
            ))
            .purpose(Purpose::new("ANALYTICS", "Usage analytics"))
            .library(ThirdPartyLibrary::vendor("com.vendor", "Vendor", "ANALYTICS"))
            .library(ThirdPartyLibrary::vendor(
                "com.vendor.analytics",
                "Vendor Analytics",
                "ANALYTICS",
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn from_is_case_insensitive() {
        let taxonomy = small();
        assert_eq!(taxonomy.permission("camera").unwrap().name(), "CAMERA");
        assert!(taxonomy.purpose("all").unwrap().is_all());
    }

    #[test]
    fn from_rejects_unknown_names() {
        let taxonomy = small();
        let err = taxonomy.permission("TELEPORT").unwrap_err();
        assert_eq!(
            err,
            PolicyError::UnknownTaxonomyValue {
                kind: TaxonomyKind::Permission,
                name: "TELEPORT".into()
            }
        );
    }

    #[test]
    fn first_registration_wins_on_origin_ambiguity() {
        let taxonomy = small();
        let lib = taxonomy
            .lookup_by_code_origin("com.vendor.analytics.Tracker")
            .unwrap();
        assert_eq!(lib.id(), "com.vendor");
    }

    #[test]
    fn classify_uses_markers_ids_and_origins() {
        let taxonomy = small();
        assert_eq!(taxonomy.classify("THIRD_PARTY_USE"), LibraryCategory::ThirdParty);
        assert_eq!(taxonomy.classify("app_internal"), LibraryCategory::AppInternal);
        assert_eq!(taxonomy.classify("com.vendor"), LibraryCategory::ThirdParty);
        assert_eq!(
            taxonomy.classify("com.vendor.sdk.Core"),
            LibraryCategory::ThirdParty
        );
        assert_eq!(
            taxonomy.classify("com.example.app.Main"),
            LibraryCategory::AppInternal
        );
    }

    #[test]
    fn duplicate_registration_fails_build() {
        let err = Taxonomy::builder()
            .purpose(Purpose::new("ALL", "again"))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::DuplicateRegistration {
                kind: TaxonomyKind::Purpose,
                ..
            }
        ));
    }

    #[test]
    fn library_default_purpose_must_be_registered() {
        let err = Taxonomy::builder()
            .library(ThirdPartyLibrary::vendor("com.x", "X", "NOWHERE"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownTaxonomyValue { .. }));
    }
}
