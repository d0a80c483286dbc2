//! Package lifecycle listener

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::PolicyEngine;

/// Notification from the package manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PackageEvent {
    Removed { package: String },
}

/// Consume package events until the sender side closes
pub fn spawn_package_listener(
    engine: Arc<PolicyEngine>,
    mut events: mpsc::Receiver<PackageEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                PackageEvent::Removed { package } => {
                    match engine.on_package_removed(&package).await {
                        Ok(removal) => info!(
                            package = %package,
                            entries = removal.entries_removed,
                            grants = removal.grants_revoked,
                            "Uninstall cascade complete"
                        ),
                        Err(e) => warn!(package = %package, error = %e, "Uninstall cascade failed"),
                    }
                }
            }
        }
        info!("Package listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::EngineConfig;
    use privgate_store::InMemoryPolicyStore;
    use privgate_types::{Action, Durability, ScopeDraft, Taxonomy};

    #[tokio::test]
    async fn removal_event_cascades() {
        let store = Arc::new(InMemoryPolicyStore::new());
        let engine = Arc::new(
            PolicyEngine::start(
                Arc::new(Taxonomy::standard()),
                store.clone(),
                Arc::new(SystemClock),
                &EngineConfig::default(),
            )
            .await
            .unwrap(),
        );
        let scope = engine
            .build_scope(&ScopeDraft::new("com.gone", "CONTACTS").purpose("ALL"))
            .unwrap();
        engine
            .record(Action::Allow, &scope, Durability::Always)
            .await
            .unwrap();
        assert_eq!(store.entry_count().await, 1);

        let (tx, rx) = mpsc::channel(8);
        let listener = spawn_package_listener(engine, rx);
        tx.send(PackageEvent::Removed {
            package: "com.gone".into(),
        })
        .await
        .unwrap();
        drop(tx);
        listener.await.unwrap();

        assert_eq!(store.entry_count().await, 0);
    }
}
