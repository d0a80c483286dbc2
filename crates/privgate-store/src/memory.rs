//! In-memory storage implementation
//!
//! Suitable for development and testing; state is lost on restart.

use async_trait::async_trait;
use privgate_types::{entry_key, PolicyEntry, Profile, Scope};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::traits::{EntryStorage, ProfileStorage};

/// In-memory policy store
#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicyStore {
    entries: Arc<RwLock<HashMap<String, PolicyEntry>>>,
    profiles: Arc<RwLock<Vec<Profile>>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all profiles
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl EntryStorage for InMemoryPolicyStore {
    async fn upsert_entry(&self, entry: PolicyEntry) -> Result<()> {
        entry
            .validate()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        let mut entries = self.entries.write().await;
        entries.insert(entry.key(), entry);
        Ok(())
    }

    async fn find_entries(&self, profile: &str, scope: &Scope) -> Result<Vec<PolicyEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&entry_key(profile, scope))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn list_entries(&self, profile: &str) -> Result<Vec<PolicyEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<PolicyEntry> = entries
            .values()
            .filter(|e| e.profile.eq_ignore_ascii_case(profile))
            .cloned()
            .collect();
        listed.sort_by_key(|e| e.scope.key());
        Ok(listed)
    }

    async fn list_entries_for_app(&self, package: &str) -> Result<Vec<PolicyEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<PolicyEntry> = entries
            .values()
            .filter(|e| e.scope.app.is_package(package))
            .cloned()
            .collect();
        listed.sort_by_key(|e| e.key());
        Ok(listed)
    }

    async fn delete_entry(&self, profile: &str, scope: &Scope) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(&entry_key(profile, scope)).is_some())
    }

    async fn delete_entries_for_app(&self, package: &str) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.scope.app.is_package(package));
        Ok(before - entries.len())
    }
}

#[async_trait]
impl ProfileStorage for InMemoryPolicyStore {
    async fn get_profile(&self, name: &str) -> Result<Option<Profile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.iter().find(|p| p.is_named(name)).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.clone())
    }

    async fn active_profile(&self) -> Result<Option<Profile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.iter().find(|p| p.active).cloned())
    }

    async fn install_profile(
        &self,
        mut profile: Profile,
        entries: Vec<PolicyEntry>,
    ) -> Result<Profile> {
        profile
            .validate()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        for entry in &entries {
            if !entry.profile.eq_ignore_ascii_case(&profile.name) {
                return Err(StoreError::InvalidRecord(format!(
                    "entry for profile {} in bundle for {}",
                    entry.profile, profile.name
                )));
            }
            entry
                .validate()
                .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        }

        // Lock order: entries, then profiles. Holding both makes the install
        // a single step for every other caller.
        let mut stored = self.entries.write().await;
        let mut profiles = self.profiles.write().await;

        if profiles.iter().any(|p| p.is_named(&profile.name)) {
            return Err(StoreError::ProfileAlreadyExists(profile.name));
        }

        for entry in entries {
            stored.insert(entry.key(), entry);
        }
        for existing in profiles.iter_mut() {
            existing.active = false;
        }
        profile.active = true;
        profiles.push(profile.clone());

        tracing::debug!(profile = %profile.name, "Profile installed and activated");
        Ok(profile)
    }

    async fn activate_profile(&self, name: &str) -> Result<Profile> {
        let mut profiles = self.profiles.write().await;
        let index = profiles
            .iter()
            .position(|p| p.is_named(name))
            .ok_or_else(|| StoreError::ProfileNotFound(name.to_string()))?;

        for (i, profile) in profiles.iter_mut().enumerate() {
            profile.active = i == index;
        }
        Ok(profiles[index].clone())
    }
}
