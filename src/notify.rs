use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Event;

/// Injected publisher for lifecycle events. Delivery (email, webhooks,
/// message bus) is implemented by the collaborator behind this trait.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub routing events to per-resource subscriber channels.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Event>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to events for a resource. Creates the channel if needed.
    pub fn subscribe(&self, resource_id: Ulid) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(resource_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Remove a channel (e.g. when a resource is retired).
    pub fn remove(&self, resource_id: &Ulid) {
        self.channels.remove(resource_id);
    }
}

impl EventSink for NotifyHub {
    /// No-op if nobody is listening on the event's resource.
    fn publish(&self, event: Event) {
        if let Some(sender) = self.channels.get(&event.resource_id()) {
            let _ = sender.send(event);
        }
    }
}
