//! Event bus for inter-component communication
//!
//! Uses tokio::sync::broadcast for pub/sub pattern. The transport publishes
//! session events here instead of calling into the router.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event types that can be published on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BusEvent {
    /// Server reported the credential as expired/invalid (envelope code 401).
    /// Session auth state has already been cleared when this is published.
    SessionInvalidated { url: String },

    /// Dynamic menu routes were registered for this session
    RoutesInstalled { route_names: Vec<String> },

    /// Menu endpoint answered with a non-success code
    MenuUnavailable { code: i64 },

    /// A navigation settled on a location
    Navigated { name: String, path: String },
}

/// Event bus handle for publishing and subscribing
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: BusEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Shared event bus wrapped in Arc for thread-safe sharing
pub type SharedBus = Arc<EventBus>;

pub fn create_bus() -> SharedBus {
    Arc::new(EventBus::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pubsub() {
        let bus = create_bus();
        let mut rx = bus.subscribe();

        bus.publish(BusEvent::SessionInvalidated {
            url: "/sys/user/info".to_string(),
        });

        match rx.recv().await.unwrap() {
            BusEvent::SessionInvalidated { url } => assert_eq!(url, "/sys/user/info"),
            other => panic!("Wrong event type: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = create_bus();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(BusEvent::MenuUnavailable { code: 1 });
    }

    #[test]
    fn test_event_wire_shape() {
        let event = BusEvent::Navigated {
            name: "home".to_string(),
            path: "/home".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Navigated");
        assert_eq!(json["payload"]["path"], "/home");
    }
}
