//! Profile manager
//!
//! Tracks which profile is active and drives installs and switches through
//! the store. Exactly one profile is active once [`ProfileManager::load`] has
//! returned.

use privgate_store::PolicyStore;
use privgate_types::{PolicyEntry, Profile, ProfileTemplate, Taxonomy};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::events::{ProfileEvent, ProfileEventBus, ProfileSubscription, SubscriberInfo};

pub struct ProfileManager {
    taxonomy: Arc<Taxonomy>,
    store: Arc<dyn PolicyStore>,
    clock: Arc<dyn Clock>,
    active: RwLock<String>,
    bus: ProfileEventBus,
    /// Serializes installs and switches
    switch_lock: Mutex<()>,
}

impl ProfileManager {
    /// Adopt the store's active profile, installing `default_template` on
    /// first start
    pub async fn load(
        taxonomy: Arc<Taxonomy>,
        store: Arc<dyn PolicyStore>,
        clock: Arc<dyn Clock>,
        default_template: &ProfileTemplate,
    ) -> Result<Self> {
        let active = match store.active_profile().await? {
            Some(profile) => profile,
            None => match store.get_profile(&default_template.name).await? {
                Some(existing) => store
                    .activate_profile(&existing.name)
                    .await
                    .map_err(EngineError::from_store)?,
                None => {
                    let entries = default_template.materialize(&taxonomy, clock.now())?;
                    let mut profile =
                        Profile::new(&default_template.name, &default_template.description);
                    profile.created_at = clock.now();
                    store
                        .install_profile(profile, entries)
                        .await
                        .map_err(EngineError::from_store)?
                }
            },
        };
        info!(profile = %active.name, "Active profile loaded");

        Ok(Self {
            taxonomy,
            store,
            clock,
            active: RwLock::new(active.name),
            bus: ProfileEventBus::new(),
            switch_lock: Mutex::new(()),
        })
    }

    /// Name of the active profile
    pub async fn active_profile(&self) -> String {
        self.active.read().await.clone()
    }

    /// Install `template` as a new profile and make it active
    ///
    /// On failure nothing is written and the previous profile stays active.
    #[instrument(skip(self, template), fields(profile = %template.name))]
    pub async fn install_profile(&self, template: &ProfileTemplate) -> Result<Profile> {
        let _guard = self.switch_lock.lock().await;

        let now = self.clock.now();
        let entries = template.materialize(&self.taxonomy, now)?;
        let entry_count = entries.len();

        let mut profile = Profile::new(&template.name, &template.description);
        profile.created_at = now;
        let installed = self
            .store
            .install_profile(profile, entries)
            .await
            .map_err(EngineError::from_store)?;

        let previous = {
            let mut active = self.active.write().await;
            std::mem::replace(&mut *active, installed.name.clone())
        };
        info!(entries = entry_count, previous = %previous, "Profile installed");

        self.bus.publish(&ProfileEvent::Installed {
            profile: installed.name.clone(),
            entries: entry_count,
        });
        self.bus.publish(&ProfileEvent::Switched {
            from: previous,
            to: installed.name.clone(),
        });
        Ok(installed)
    }

    /// Make `name` the active profile
    ///
    /// Entries of the previous profile are left untouched. Resolutions
    /// already in flight may still see the previous profile.
    #[instrument(skip(self))]
    pub async fn switch_profile(&self, name: &str) -> Result<Profile> {
        let _guard = self.switch_lock.lock().await;

        let activated = self
            .store
            .activate_profile(name)
            .await
            .map_err(EngineError::from_store)?;

        let previous = {
            let mut active = self.active.write().await;
            std::mem::replace(&mut *active, activated.name.clone())
        };

        if !activated.is_named(&previous) {
            info!(from = %previous, to = %activated.name, "Profile switched");
            self.bus.publish(&ProfileEvent::Switched {
                from: previous,
                to: activated.name.clone(),
            });
        }
        Ok(activated)
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.store.list_profiles().await?)
    }

    /// Entries stored under `name`, whether or not it is active
    pub async fn entries_for(&self, name: &str) -> Result<Vec<PolicyEntry>> {
        let profile = self
            .store
            .get_profile(name)
            .await?
            .ok_or_else(|| EngineError::ProfileNotFound(name.to_string()))?;
        Ok(self.store.list_entries(&profile.name).await?)
    }

    pub fn subscribe(&self, label: impl Into<String>) -> ProfileSubscription {
        self.bus.subscribe(label)
    }

    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn subscribers(&self) -> Vec<SubscriberInfo> {
        self.bus.subscribers()
    }
}

impl std::fmt::Debug for ProfileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileManager")
            .field("subscribers", &self.bus.subscribers().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use privgate_store::InMemoryPolicyStore;
    use privgate_types::{Action, TemplateRule};

    async fn manager(store: Arc<InMemoryPolicyStore>) -> ProfileManager {
        ProfileManager::load(
            Arc::new(Taxonomy::standard()),
            store,
            Arc::new(SystemClock),
            &ProfileTemplate::default_profile(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn first_start_installs_default() {
        let store = Arc::new(InMemoryPolicyStore::new());
        let profiles = manager(store.clone()).await;
        assert_eq!(profiles.active_profile().await, "Default");
        assert_eq!(profiles.list_profiles().await.unwrap().len(), 1);

        // A second load adopts the stored active profile instead of reinstalling.
        let again = manager(store).await;
        assert_eq!(again.active_profile().await, "Default");
        assert_eq!(again.list_profiles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn install_activates_and_notifies() {
        let profiles = manager(Arc::new(InMemoryPolicyStore::new())).await;
        let mut events = profiles.subscribe("test");

        let installed = profiles
            .install_profile(&ProfileTemplate::organizational())
            .await
            .unwrap();
        assert!(installed.active);
        assert_eq!(profiles.active_profile().await, "Organizational");
        assert_eq!(
            events.recv().await,
            Some(ProfileEvent::Installed {
                profile: "Organizational".into(),
                entries: 6
            })
        );
        assert_eq!(
            events.recv().await,
            Some(ProfileEvent::Switched {
                from: "Default".into(),
                to: "Organizational".into()
            })
        );
        assert_eq!(profiles.entries_for("organizational").await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn failed_install_keeps_previous_profile() {
        let store = Arc::new(InMemoryPolicyStore::new());
        let profiles = manager(store.clone()).await;
        let broken = ProfileTemplate::new("Broken", "")
            .rule(TemplateRule::everywhere("SMS", Action::Deny))
            .rule(TemplateRule::everywhere("TELEPATHY", Action::Deny));

        assert!(matches!(
            profiles.install_profile(&broken).await,
            Err(EngineError::Policy(_))
        ));
        assert_eq!(profiles.active_profile().await, "Default");
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn switch_to_unknown_profile_fails() {
        let profiles = manager(Arc::new(InMemoryPolicyStore::new())).await;
        assert!(matches!(
            profiles.switch_profile("Nope").await,
            Err(EngineError::ProfileNotFound(_))
        ));
        assert!(matches!(
            profiles.entries_for("Nope").await,
            Err(EngineError::ProfileNotFound(_))
        ));
        assert_eq!(profiles.active_profile().await, "Default");
    }
}
