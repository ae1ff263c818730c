//! Save lifecycle event broadcasting.
//!
//! Persists triggered by score submissions run in the background and hand no
//! result back to the submitter. Hosts that need to know when a save landed
//! (a "saved" toast, a test waiting for disk state) subscribe here instead.
//!
//! # Example
//!
//! ```rust
//! use savekeeper_core::event_bus::{SaveEvent, SaveEventBus};
//!
//! let bus = SaveEventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.emit(SaveEvent::ProfileUnloaded { profile_name: "Ada".into() });
//!
//! // In async context:
//! // let event = rx.recv().await.unwrap();
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::persistence::store::WriteReport;

/// Default channel capacity for the event bus.
/// Events beyond this capacity will cause slow subscribers to miss events (lag).
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaveEvent {
    /// An existing save file was read and decoded.
    ProfileLoaded { profile_name: String },

    /// No usable save file existed; a fresh profile replaced it.
    ProfileCreated { profile_name: String },

    ProfileUnloaded { profile_name: String },

    /// A persist finished writing.
    ProfileSaved {
        profile_name: String,
        report: WriteReport,
    },

    /// A persist gave up; the in-memory profile is unchanged.
    SaveFailed {
        profile_name: String,
        message: String,
    },
}

impl SaveEvent {
    pub fn profile_name(&self) -> &str {
        match self {
            SaveEvent::ProfileLoaded { profile_name }
            | SaveEvent::ProfileCreated { profile_name }
            | SaveEvent::ProfileUnloaded { profile_name }
            | SaveEvent::ProfileSaved { profile_name, .. }
            | SaveEvent::SaveFailed { profile_name, .. } => profile_name,
        }
    }
}

/// Broadcasts [`SaveEvent`]s to any number of subscribers.
///
/// Uses a tokio broadcast channel internally. Events emitted while nobody is
/// subscribed are dropped.
#[derive(Clone)]
pub struct SaveEventBus {
    sender: broadcast::Sender<SaveEvent>,
}

impl SaveEventBus {
    /// Create a new bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new bus with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    pub fn emit(&self, event: SaveEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all future events. Past events are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SaveEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unloaded(name: &str) -> SaveEvent {
        SaveEvent::ProfileUnloaded {
            profile_name: name.to_string(),
        }
    }

    #[test]
    fn serializes_with_kind_tag() {
        let event = SaveEvent::ProfileSaved {
            profile_name: "Ada".to_string(),
            report: WriteReport::Rewritten,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "profile_saved");
        assert_eq!(json["profile_name"], "Ada");
        assert_eq!(json["report"], "rewritten");
        assert_eq!(event.profile_name(), "Ada");
    }

    #[test]
    fn subscribe_and_drop_track_count() {
        let bus = SaveEventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn emit_returns_zero_with_no_subscribers() {
        let bus = SaveEventBus::new();
        assert_eq!(bus.emit(unloaded("a")), 0);
    }

    #[tokio::test]
    async fn events_arrive_in_order() {
        let bus = SaveEventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(unloaded("a"));
        bus.emit(unloaded("b"));

        assert_eq!(rx.recv().await.unwrap(), unloaded("a"));
        assert_eq!(rx.recv().await.unwrap(), unloaded("b"));
    }

    #[tokio::test]
    async fn late_subscriber_misses_old_events() {
        let bus = SaveEventBus::new();
        let mut early = bus.subscribe();

        bus.emit(unloaded("early"));
        let mut late = bus.subscribe();
        bus.emit(unloaded("later"));

        assert_eq!(early.recv().await.unwrap().profile_name(), "early");
        assert_eq!(early.recv().await.unwrap().profile_name(), "later");
        assert_eq!(late.recv().await.unwrap().profile_name(), "later");
    }
}
