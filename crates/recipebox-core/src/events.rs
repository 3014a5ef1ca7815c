//! Change notifications
//!
//! Every successful write through the store emits a [`StoreEvent`] on a
//! `tokio::sync::broadcast` channel. Views that keep their own copy of the
//! collection subscribe and re-fetch instead of drifting out of date.
//!
//! Emitting never blocks: with no subscribers the event is dropped, and a
//! lagging subscriber loses old events rather than stalling writers.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Buffered events per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<StoreEvent>;

/// A committed change to the stored collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The whole collection was replaced
    Replaced { count: usize },
    /// A recipe was added
    Added { id: Uuid },
    /// A recipe was edited
    Updated { id: Uuid },
    /// Favorite flags were flipped on these recipes
    FavoriteToggled { ids: Vec<Uuid> },
    /// These recipes were removed
    Deleted { ids: Vec<Uuid> },
}

/// Broadcast channel for store events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event to current subscribers, if any
    pub fn emit(&self, event: StoreEvent) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers() {
        let bus = EventBus::default();
        bus.emit(StoreEvent::Replaced { count: 0 });

        // A late subscriber does not see earlier events
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_all_subscribers_receive() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let id = Uuid::new_v4();
        bus.emit(StoreEvent::Added { id });

        assert_eq!(a.recv().await.unwrap(), StoreEvent::Added { id });
        assert_eq!(b.recv().await.unwrap(), StoreEvent::Added { id });
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(StoreEvent::Replaced { count: 3 }).unwrap();
        assert_eq!(json["type"], "replaced");
        assert_eq!(json["count"], 3);
    }
}
