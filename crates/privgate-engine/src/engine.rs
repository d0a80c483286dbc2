//! Policy resolution engine
//!
//! Resolution consults the ask-grant cache first and then the store under
//! the active profile, walking the specificity chain. Recording writes either
//! an ephemeral grant or a persisted entry.

use dashmap::DashMap;
use privgate_store::PolicyStore;
use privgate_types::{
    Action, AppTarget, Durability, LibraryCategory, PolicyEntry, Scope, ScopeDraft, Taxonomy,
    ThirdPartyLibrary,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::grants::{AskGrant, AskGrantCache};
use crate::profiles::ProfileManager;
use crate::request::AccessRequest;
use crate::resolution::{pick_entry, specificity_chain, Resolution, ResolutionSource};

/// What `record` did with a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// An "allow once" grant now covers the scope
    Granted(AskGrant),
    /// The decision was persisted under the active profile
    Persisted(PolicyEntry),
}

/// Result of an uninstall cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackageRemoval {
    pub entries_removed: usize,
    pub grants_revoked: usize,
}

pub struct PolicyEngine {
    taxonomy: Arc<Taxonomy>,
    store: Arc<dyn PolicyStore>,
    profiles: Arc<ProfileManager>,
    grants: AskGrantCache,
    clock: Arc<dyn Clock>,
    /// One lock per scope identity being recorded
    scope_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PolicyEngine {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        store: Arc<dyn PolicyStore>,
        profiles: Arc<ProfileManager>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            grants: AskGrantCache::new(clock.clone(), config.ask_grant_timeframe()),
            taxonomy,
            store,
            profiles,
            clock,
            scope_locks: DashMap::new(),
        }
    }

    /// Load the profile manager from `store` and build an engine around it
    pub async fn start(
        taxonomy: Arc<Taxonomy>,
        store: Arc<dyn PolicyStore>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let profiles = ProfileManager::load(
            taxonomy.clone(),
            store.clone(),
            clock.clone(),
            &config.default_template(),
        )
        .await?;
        Ok(Self::new(
            taxonomy,
            store,
            Arc::new(profiles),
            clock,
            config,
        ))
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    pub fn profiles(&self) -> &Arc<ProfileManager> {
        &self.profiles
    }

    pub fn grants(&self) -> &AskGrantCache {
        &self.grants
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Build the scope tuple for a raw request
    ///
    /// Code from the app itself, or from an origin no registered vendor
    /// matches, is covered by the wildcard library. The purpose defaults to
    /// the library's default purpose.
    pub fn scope_for(&self, request: &AccessRequest) -> Result<Scope> {
        request.validate()?;
        let permission = self.taxonomy.permission(&request.permission)?.clone();
        let library = self.library_for(request.origin());
        let purpose = match request.purpose_name() {
            Some(name) => self.taxonomy.purpose(name)?.clone(),
            None => self
                .taxonomy
                .purpose(library.default_purpose())
                .unwrap_or_else(|_| self.taxonomy.all_purpose())
                .clone(),
        };
        let scope = Scope::new(
            AppTarget::package(request.app.trim()),
            permission,
            purpose,
            library,
        );
        scope.validate()?;
        Ok(scope)
    }

    fn library_for(&self, origin: Option<&str>) -> ThirdPartyLibrary {
        let Some(origin) = origin else {
            return self.taxonomy.all_library().clone();
        };
        if self.taxonomy.classify(origin) == LibraryCategory::AppInternal {
            return self.taxonomy.all_library().clone();
        }
        self.taxonomy
            .library(origin)
            .ok()
            .or_else(|| self.taxonomy.lookup_by_code_origin(origin))
            .unwrap_or_else(|| self.taxonomy.category_library(LibraryCategory::ThirdParty))
            .clone()
    }

    /// Validate an externally supplied scope against the taxonomy
    pub fn build_scope(&self, draft: &ScopeDraft) -> Result<Scope> {
        Ok(draft.build(&self.taxonomy)?)
    }

    /// Resolve a request under the active profile
    #[instrument(skip(self, request), fields(app = %request.app, permission = %request.permission))]
    pub async fn resolve(&self, request: &AccessRequest) -> Result<Resolution> {
        let scope = self.scope_for(request)?;
        let profile = self.profiles.active_profile().await;
        Ok(self.resolve_scope(&scope, &profile).await)
    }

    /// Resolve an already-built scope under `profile`
    ///
    /// Store failures skip the failing candidate. A failure ahead of an Allow
    /// turns the result into Ask, so an unreadable rule never fails open.
    pub async fn resolve_scope(&self, scope: &Scope, profile: &str) -> Resolution {
        let now = self.clock.now();

        if let Some(grant) = self.grants.lookup(scope) {
            let mut resolution =
                Resolution::new(scope.clone(), profile, Action::Allow, ResolutionSource::Grant, now);
            resolution.grant_expires_at = Some(grant.expires_at);
            debug!(scope = %scope, source = "grant", "Resolved");
            return resolution;
        }

        let mut failures = 0;
        for candidate in specificity_chain(scope, &self.taxonomy) {
            let entries = match self.store.find_entries(profile, &candidate.scope).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        candidate = %candidate.scope,
                        level = ?candidate.level,
                        error = %e,
                        "Policy store lookup failed, skipping candidate"
                    );
                    failures += 1;
                    continue;
                }
            };
            let Some(entry) = pick_entry(entries) else {
                continue;
            };

            let action = if failures > 0 && entry.action.is_allow() {
                warn!(scope = %scope, "Allow found past a failed lookup, asking instead");
                Action::Ask
            } else {
                entry.action
            };
            let mut resolution =
                Resolution::new(scope.clone(), profile, action, ResolutionSource::Policy, now);
            resolution.level = Some(candidate.level);
            resolution.matched = Some(entry);
            resolution.store_failures = failures;
            debug!(scope = %scope, source = "policy", level = ?candidate.level, action = %action, "Resolved");
            return resolution;
        }

        let mut resolution =
            Resolution::new(scope.clone(), profile, Action::Ask, ResolutionSource::Default, now);
        resolution.store_failures = failures;
        debug!(scope = %scope, source = "default", "Resolved");
        resolution
    }

    /// Record a decision for `scope`
    ///
    /// `Once` keeps an in-memory grant and only accepts Allow. `Always`
    /// upserts an entry under the active profile and drops any grant for the
    /// same scope. Concurrent records for one scope are applied one at a time.
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn record(
        &self,
        action: Action,
        scope: &Scope,
        durability: Durability,
    ) -> Result<RecordOutcome> {
        scope.validate()?;
        if durability == Durability::Once && !action.is_allow() {
            return Err(EngineError::InvalidDecision(format!(
                "only allow can be granted once, got {action}"
            )));
        }

        let key = scope.key();
        let lock = self.scope_locks.entry(key.clone()).or_default().clone();
        let outcome = {
            let _guard = lock.lock().await;
            self.apply_record(action, scope, durability).await
        };
        drop(lock);
        self.scope_locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        outcome
    }

    async fn apply_record(
        &self,
        action: Action,
        scope: &Scope,
        durability: Durability,
    ) -> Result<RecordOutcome> {
        match durability {
            Durability::Once => {
                let grant = self.grants.grant(scope)?;
                debug!(expires_at = %grant.expires_at, "Ask grant recorded");
                Ok(RecordOutcome::Granted(grant))
            }
            Durability::Always => {
                let profile = self.profiles.active_profile().await;
                let entry = PolicyEntry::new(profile, scope.clone(), action, self.clock.now());
                self.store
                    .upsert_entry(entry.clone())
                    .await
                    .map_err(EngineError::from_store)?;
                self.grants.revoke(scope);
                info!(profile = %entry.profile, action = %action, "Policy entry recorded");
                Ok(RecordOutcome::Persisted(entry))
            }
        }
    }

    /// Lifetime of grants recorded from now on
    ///
    /// Zero and anything above [`crate::grants::MAX_ASK_GRANT_TIMEFRAME`] are rejected.
    pub fn set_ask_grant_timeframe(&self, timeframe: Duration) -> Result<()> {
        self.grants.set_timeframe(timeframe)?;
        info!(secs = timeframe.as_secs(), "Ask grant timeframe changed");
        Ok(())
    }

    pub fn ask_grant_timeframe(&self) -> Duration {
        self.grants.timeframe()
    }

    /// Cascade an uninstall: every entry naming `package`, in every profile,
    /// and every outstanding grant for it
    #[instrument(skip(self))]
    pub async fn on_package_removed(&self, package: &str) -> Result<PackageRemoval> {
        let package = package.trim();
        if package.is_empty() || package == privgate_types::APP_ALL {
            return Err(EngineError::InvalidRequest(format!(
                "cannot remove package {package:?}"
            )));
        }
        let entries_removed = self
            .store
            .delete_entries_for_app(package)
            .await
            .map_err(EngineError::from_store)?;
        let grants_revoked = self.grants.revoke_app(package);
        info!(entries_removed, grants_revoked, "Package policy removed");
        Ok(PackageRemoval {
            entries_removed,
            grants_revoked,
        })
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("grants", &self.grants.len())
            .field("profiles", &self.profiles)
            .finish_non_exhaustive()
    }
}
