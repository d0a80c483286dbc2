//! Profile change notifications
//!
//! Subscribers register explicitly and can be listed, so it is always known
//! who will observe a profile switch. Each subscriber gets its own unbounded
//! channel; a subscriber whose receiver has been dropped is pruned on the
//! next publish.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Something happened to the set of profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileEvent {
    /// A template was installed as a new profile
    Installed { profile: String, entries: usize },
    /// The active profile changed
    Switched { from: String, to: String },
}

/// A registered subscriber, as listed by [`ProfileEventBus::subscribers`]
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberInfo {
    pub id: Uuid,
    pub label: String,
    pub subscribed_at: DateTime<Utc>,
}

/// Receiving half handed to a subscriber
#[derive(Debug)]
pub struct ProfileSubscription {
    id: Uuid,
    receiver: mpsc::UnboundedReceiver<ProfileEvent>,
}

impl ProfileSubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event; `None` once unsubscribed
    pub async fn recv(&mut self) -> Option<ProfileEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ProfileEvent> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Debug)]
struct Subscriber {
    info: SubscriberInfo,
    sender: mpsc::UnboundedSender<ProfileEvent>,
}

#[derive(Debug, Default)]
pub struct ProfileEventBus {
    subscribers: DashMap<Uuid, Subscriber>,
}

impl ProfileEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, label: impl Into<String>) -> ProfileSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let info = SubscriberInfo {
            id: Uuid::new_v4(),
            label: label.into(),
            subscribed_at: Utc::now(),
        };
        let id = info.id;
        debug!(subscriber = %id, label = %info.label, "Profile subscriber registered");
        self.subscribers.insert(id, Subscriber { info, sender });
        ProfileSubscription { id, receiver }
    }

    /// Remove a subscriber; returns whether it was registered
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Current subscribers, oldest first
    pub fn subscribers(&self) -> Vec<SubscriberInfo> {
        let mut listed: Vec<SubscriberInfo> = self
            .subscribers
            .iter()
            .map(|s| s.info.clone())
            .collect();
        listed.sort_by_key(|s| s.subscribed_at);
        listed
    }

    /// Deliver `event` to every live subscriber; returns how many got it
    pub fn publish(&self, event: &ProfileEvent) -> usize {
        self.subscribers
            .retain(|_, s| s.sender.send(event.clone()).is_ok());
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = ProfileEventBus::new();
        let mut ui = bus.subscribe("settings-ui");
        let mut audit = bus.subscribe("audit");
        assert_eq!(bus.subscribers().len(), 2);

        let event = ProfileEvent::Switched {
            from: "Default".into(),
            to: "Organizational".into(),
        };
        assert_eq!(bus.publish(&event), 2);
        assert_eq!(ui.recv().await, Some(event.clone()));
        assert_eq!(audit.try_recv(), Some(event));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = ProfileEventBus::new();
        let kept = bus.subscribe("kept");
        drop(bus.subscribe("gone"));

        let delivered = bus.publish(&ProfileEvent::Installed {
            profile: "Work".into(),
            entries: 3,
        });
        assert_eq!(delivered, 1);
        assert_eq!(bus.subscribers()[0].label, "kept");

        assert!(bus.unsubscribe(kept.id()));
        assert!(!bus.unsubscribe(kept.id()));
        assert!(bus.subscribers().is_empty());
    }
}
