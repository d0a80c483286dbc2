//! Storage trait definitions

use async_trait::async_trait;
use privgate_types::{PolicyEntry, Profile, Scope};

use crate::error::Result;

/// Combined storage trait the engine depends on
pub trait PolicyStore: EntryStorage + ProfileStorage + Send + Sync {}

impl<T> PolicyStore for T where T: EntryStorage + ProfileStorage + Send + Sync {}

/// Storage for policy entries
#[async_trait]
pub trait EntryStorage: Send + Sync {
    /// Create or replace the entry with the same (profile, scope) key
    async fn upsert_entry(&self, entry: PolicyEntry) -> Result<()>;

    /// Every stored entry for exactly this (profile, scope)
    ///
    /// Backends keyed on the case-insensitive identity return at most one
    /// entry; backends that are not may return several, and callers pick
    /// among them.
    async fn find_entries(&self, profile: &str, scope: &Scope) -> Result<Vec<PolicyEntry>>;

    /// All entries belonging to a profile
    async fn list_entries(&self, profile: &str) -> Result<Vec<PolicyEntry>>;

    /// All entries, across profiles, whose app is literally `package`
    async fn list_entries_for_app(&self, package: &str) -> Result<Vec<PolicyEntry>>;

    /// Delete one entry; returns whether it existed
    async fn delete_entry(&self, profile: &str, scope: &Scope) -> Result<bool>;

    /// Cascade-delete every entry for `package` across all profiles
    ///
    /// Returns the number of entries removed. Wildcard-app entries are kept.
    async fn delete_entries_for_app(&self, package: &str) -> Result<usize>;

    /// Most recently updated entry for this (profile, scope), if any
    async fn get_entry(&self, profile: &str, scope: &Scope) -> Result<Option<PolicyEntry>> {
        Ok(self
            .find_entries(profile, scope)
            .await?
            .into_iter()
            .max_by_key(|entry| entry.updated_at))
    }
}

/// Storage for profile records
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    async fn get_profile(&self, name: &str) -> Result<Option<Profile>>;

    async fn list_profiles(&self) -> Result<Vec<Profile>>;

    /// The single active profile, if any profile exists yet
    async fn active_profile(&self) -> Result<Option<Profile>>;

    /// Write `entries`, create `profile` and make it the sole active one
    ///
    /// All or nothing: on error no entry is written and the previously
    /// active profile stays active.
    async fn install_profile(&self, profile: Profile, entries: Vec<PolicyEntry>)
        -> Result<Profile>;

    /// Deactivate every profile and activate `name`
    async fn activate_profile(&self, name: &str) -> Result<Profile>;
}
