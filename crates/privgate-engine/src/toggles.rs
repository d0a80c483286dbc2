//! Settings toggles for one permission
//!
//! The device-wide setting is the root of a [`StateTree`], each tracked app a
//! child. Flipping a toggle propagates through the tree and every node whose
//! value changed is persisted with `record(.., Always)`.

use privgate_tree::{NodeId, StateTree};
use privgate_types::{Action, AppTarget, Durability, PermissionKind, Scope};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::engine::PolicyEngine;
use crate::error::{EngineError, Result};

#[derive(Debug)]
pub struct PermissionToggles {
    engine: Arc<PolicyEngine>,
    permission: PermissionKind,
    tree: StateTree<Action>,
    device: NodeId,
    apps: HashMap<String, NodeId>,
    scopes: HashMap<NodeId, Scope>,
}

impl PermissionToggles {
    /// Build the toggle tree for `permission` from the active profile
    pub async fn load(engine: Arc<PolicyEngine>, permission: &str, apps: &[&str]) -> Result<Self> {
        let permission = engine.taxonomy().permission(permission)?.clone();
        let device_scope = Scope::new(
            AppTarget::All,
            permission.clone(),
            engine.taxonomy().all_purpose().clone(),
            engine.taxonomy().all_library().clone(),
        );
        let profile = engine.profiles().active_profile().await;

        let mut tree = StateTree::new();
        let device_action = engine.resolve_scope(&device_scope, &profile).await.action;
        let device = tree.insert(device_action);

        let mut toggles = Self {
            engine,
            permission,
            tree,
            device,
            apps: HashMap::new(),
            scopes: HashMap::from([(device, device_scope)]),
        };
        for app in apps {
            toggles.track_app(app).await?;
        }
        Ok(toggles)
    }

    pub fn permission(&self) -> &PermissionKind {
        &self.permission
    }

    /// Add an app under the device toggle, initialised from the active profile
    pub async fn track_app(&mut self, package: &str) -> Result<NodeId> {
        let key = package.trim().to_ascii_lowercase();
        if key.is_empty() || key == privgate_types::APP_ALL {
            return Err(EngineError::InvalidRequest(format!(
                "cannot track app {package:?}"
            )));
        }
        if let Some(&node) = self.apps.get(&key) {
            return Ok(node);
        }

        let scope = self.device_scope().with_app(AppTarget::package(package.trim()));
        let profile = self.engine.profiles().active_profile().await;
        let action = self.engine.resolve_scope(&scope, &profile).await.action;
        let node = self
            .tree
            .insert_child(self.device, action)
            .ok_or_else(|| EngineError::InvalidRequest("device toggle missing".into()))?;
        self.apps.insert(key, node);
        self.scopes.insert(node, scope);
        Ok(node)
    }

    pub fn device_action(&self) -> Option<Action> {
        self.tree.value(self.device).copied()
    }

    pub fn app_action(&self, package: &str) -> Option<Action> {
        let node = self.apps.get(&package.trim().to_ascii_lowercase())?;
        self.tree.value(*node).copied()
    }

    /// Set the device-wide toggle; every tracked app follows
    pub async fn set_device(&mut self, action: Action) -> Result<Vec<Scope>> {
        self.apply(self.device, action).await
    }

    /// Set one app's toggle; the device toggle follows when all apps agree
    pub async fn set_app(&mut self, package: &str, action: Action) -> Result<Vec<Scope>> {
        let node = *self
            .apps
            .get(&package.trim().to_ascii_lowercase())
            .ok_or_else(|| EngineError::InvalidRequest(format!("app {package} is not tracked")))?;
        self.apply(node, action).await
    }

    /// Propagate, then persist the toggled node and every node that changed
    ///
    /// If a write fails the tree is reloaded from the active profile, so it
    /// never shows a value the store does not hold.
    #[instrument(skip(self), fields(permission = %self.permission))]
    async fn apply(&mut self, node: NodeId, action: Action) -> Result<Vec<Scope>> {
        let before = self.snapshot();
        self.tree.propagate_state_change(node, action);

        let mut changed: Vec<NodeId> = before
            .into_iter()
            .filter(|(id, old)| *id == node || self.tree.value(*id) != Some(old))
            .map(|(id, _)| id)
            .collect();
        changed.sort_by_key(|id| id.index());

        let mut written = Vec::with_capacity(changed.len());
        for id in changed {
            let (Some(scope), Some(value)) = (self.scopes.get(&id), self.tree.value(id)) else {
                continue;
            };
            if let Err(e) = self.engine.record(*value, scope, Durability::Always).await {
                warn!(written = written.len(), error = %e, "Toggle change only partly persisted");
                self.reload().await;
                return Err(e);
            }
            written.push(scope.clone());
        }
        debug!(written = written.len(), "Toggle change persisted");
        Ok(written)
    }

    /// Reset every node to what the active profile resolves it to
    async fn reload(&mut self) {
        let profile = self.engine.profiles().active_profile().await;
        let nodes: Vec<(NodeId, Scope)> = self
            .snapshot()
            .into_iter()
            .filter_map(|(id, _)| self.scopes.get(&id).map(|scope| (id, scope.clone())))
            .collect();
        for (id, scope) in nodes {
            let action = self.engine.resolve_scope(&scope, &profile).await.action;
            self.tree.replace_value(id, action);
        }
    }

    fn snapshot(&self) -> Vec<(NodeId, Action)> {
        std::iter::once(self.device)
            .chain(self.tree.descendants(self.device))
            .filter_map(|id| self.tree.value(id).map(|v| (id, *v)))
            .collect()
    }

    fn device_scope(&self) -> &Scope {
        &self.scopes[&self.device]
    }
}
