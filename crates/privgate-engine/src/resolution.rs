//! Specificity chain and resolution records
//!
//! A request scope is matched against stored entries by walking an explicit,
//! ordered list of candidate scopes from most to least specific. The first
//! candidate with an entry decides.

use chrono::{DateTime, Utc};
use privgate_types::{Action, AppTarget, PolicyEntry, Scope, Taxonomy};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use uuid::Uuid;

/// Position of a candidate in the specificity chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    /// (app, permission, purpose, library)
    AppPurposeLibrary,
    /// (app, permission, purpose, library category)
    AppPurposeCategory,
    /// (app, permission, purpose, ALL)
    AppPurpose,
    /// (app, permission, ALL, ALL)
    AppPermission,
    /// (ALL, permission, purpose, library)
    AnyAppPurposeLibrary,
    /// (ALL, permission, purpose, library category)
    AnyAppPurposeCategory,
    /// (ALL, permission, ALL, ALL)
    AnyAppPermission,
}

/// One scope to look up, tagged with its place in the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub level: Specificity,
    pub scope: Scope,
}

/// Candidate scopes for `scope`, most specific first
///
/// Candidates that collapse onto an earlier one (because the request already
/// uses a wildcard) are dropped, so each scope identity is looked up once.
/// Vendor libraries are followed by their category pseudo-library so that
/// bulk rules such as "deny third parties" apply to every vendor.
pub fn specificity_chain(scope: &Scope, taxonomy: &Taxonomy) -> Vec<Candidate> {
    let all_purpose = taxonomy.all_purpose().clone();
    let all_library = taxonomy.all_library().clone();
    let category = scope
        .library
        .category()
        .filter(|_| scope.library.is_vendor())
        .map(|c| taxonomy.category_library(c).clone());

    let app_level = scope.clone();
    let any_app = scope.with_app(AppTarget::All);

    let mut raw = Vec::with_capacity(7);
    raw.push((Specificity::AppPurposeLibrary, app_level.clone()));
    if let Some(cat) = &category {
        raw.push((
            Specificity::AppPurposeCategory,
            app_level.with_library(cat.clone()),
        ));
    }
    raw.push((
        Specificity::AppPurpose,
        app_level.with_library(all_library.clone()),
    ));
    raw.push((
        Specificity::AppPermission,
        app_level
            .with_purpose(all_purpose.clone())
            .with_library(all_library.clone()),
    ));
    raw.push((Specificity::AnyAppPurposeLibrary, any_app.clone()));
    if let Some(cat) = &category {
        raw.push((
            Specificity::AnyAppPurposeCategory,
            any_app.with_library(cat.clone()),
        ));
    }
    raw.push((
        Specificity::AnyAppPermission,
        any_app.with_purpose(all_purpose).with_library(all_library),
    ));

    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|(_, candidate)| seen.insert(candidate.key()))
        .map(|(level, scope)| Candidate { level, scope })
        .collect()
}

/// Pick the deciding entry among several stored for one candidate
///
/// Latest `updated_at` wins, then the greater entry key. Entries agreeing on
/// both resolve to the most restrictive action.
pub fn pick_entry(entries: Vec<PolicyEntry>) -> Option<PolicyEntry> {
    entries.into_iter().max_by(compare_entries)
}

fn compare_entries(a: &PolicyEntry, b: &PolicyEntry) -> Ordering {
    a.updated_at
        .cmp(&b.updated_at)
        .then_with(|| a.key().cmp(&b.key()))
        .then_with(|| restrictiveness(a.action).cmp(&restrictiveness(b.action)))
}

fn restrictiveness(action: Action) -> u8 {
    match action {
        Action::Allow => 0,
        Action::Ask => 1,
        Action::Deny => 2,
    }
}

/// Where a resolved action came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Unexpired "allow once" grant
    Grant,
    /// Stored policy entry
    Policy,
    /// Nothing matched
    Default,
}

/// Outcome of resolving one scope, kept for audit
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub id: Uuid,
    pub scope: Scope,
    pub profile: String,
    pub action: Action,
    pub source: ResolutionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<PolicyEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Specificity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_expires_at: Option<DateTime<Utc>>,
    pub resolved_at: DateTime<Utc>,
    /// Candidates skipped because the store failed to answer
    pub store_failures: usize,
}

impl Resolution {
    pub(crate) fn new(
        scope: Scope,
        profile: impl Into<String>,
        action: Action,
        source: ResolutionSource,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            profile: profile.into(),
            action,
            source,
            matched: None,
            level: None,
            grant_expires_at: None,
            resolved_at,
            store_failures: 0,
        }
    }

    pub fn is_ask(&self) -> bool {
        self.action.is_ask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privgate_types::ScopeDraft;

    fn levels(chain: &[Candidate]) -> Vec<Specificity> {
        chain.iter().map(|c| c.level).collect()
    }

    #[test]
    fn full_chain_for_vendor_library() {
        let taxonomy = Taxonomy::standard();
        let scope = ScopeDraft::new("com.example.app", "FINE_LOCATION")
            .purpose("DISPLAY_ADVERTISEMENT")
            .library("com.facebook.ads")
            .build(&taxonomy)
            .unwrap();
        let chain = specificity_chain(&scope, &taxonomy);
        assert_eq!(
            levels(&chain),
            vec![
                Specificity::AppPurposeLibrary,
                Specificity::AppPurposeCategory,
                Specificity::AppPurpose,
                Specificity::AppPermission,
                Specificity::AnyAppPurposeLibrary,
                Specificity::AnyAppPurposeCategory,
                Specificity::AnyAppPermission,
            ]
        );
        assert_eq!(
            chain[5].scope.key(),
            "*:fine_location:display_advertisement:third_party_use"
        );
        assert_eq!(chain[6].scope.key(), "*:fine_location:all:all");
    }

    #[test]
    fn wildcards_collapse_duplicate_candidates() {
        let taxonomy = Taxonomy::standard();
        let scope = ScopeDraft::new("A", "CAMERA")
            .purpose("ALL")
            .build(&taxonomy)
            .unwrap();
        let chain = specificity_chain(&scope, &taxonomy);
        assert_eq!(
            levels(&chain),
            vec![Specificity::AppPurposeLibrary, Specificity::AnyAppPurposeLibrary]
        );
    }

    #[test]
    fn category_library_is_not_refined_again() {
        let taxonomy = Taxonomy::standard();
        let scope = ScopeDraft::new("A", "CONTACTS")
            .purpose("ANALYTICS")
            .library("THIRD_PARTY_USE")
            .build(&taxonomy)
            .unwrap();
        let chain = specificity_chain(&scope, &taxonomy);
        assert!(!chain
            .iter()
            .any(|c| c.level == Specificity::AppPurposeCategory));
        assert_eq!(chain.len(), 5);
    }

    #[test]
    fn pick_entry_prefers_latest_then_most_restrictive() {
        let taxonomy = Taxonomy::standard();
        let scope = ScopeDraft::new("A", "SMS")
            .purpose("ALL")
            .build(&taxonomy)
            .unwrap();
        let t0 = Utc::now();
        let older = PolicyEntry::new("Default", scope.clone(), Action::Deny, t0);
        let newer = PolicyEntry::new(
            "Default",
            scope.clone(),
            Action::Allow,
            t0 + chrono::Duration::seconds(1),
        );
        let picked = pick_entry(vec![older.clone(), newer.clone()]).unwrap();
        assert_eq!(picked.action, Action::Allow);

        let tied = PolicyEntry::new("Default", scope, Action::Allow, t0);
        let picked = pick_entry(vec![tied, older]).unwrap();
        assert_eq!(picked.action, Action::Deny);

        assert!(pick_entry(Vec::new()).is_none());
    }
}
