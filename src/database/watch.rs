//! Change notification for live queries
//!
//! [`ChangeHub`] is an in-process publish/subscribe hub backed by
//! `tokio::sync::broadcast`. The repository publishes a [`StoreEvent`]
//! after every committed write; UI-side live queries re-run whenever an
//! event touches the record kind they read. Readers therefore always
//! eventually observe the latest committed state.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// The record kind a write touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Notebook,
    Section,
    Page,
    PageElement,
    Tag,
    PageTag,
    Attachment,
    Setting,
}

/// A committed write against the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub kind: RecordKind,
}

/// In-process fan-out hub for store change events.
///
/// Any number of subscribers independently receive every published
/// event. Slow receivers that overflow the buffer observe
/// `RecvError::Lagged` and should re-run their query from scratch.
#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<StoreEvent>,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a change to all current subscribers.
    ///
    /// A send error only means there are zero receivers; that is not a
    /// failure for fire-and-forget notification.
    pub fn publish(&self, kind: RecordKind) {
        let _ = self.sender.send(StoreEvent { kind });
    }

    /// Subscribe to all change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let hub = ChangeHub::default();
        let mut rx = hub.subscribe();

        hub.publish(RecordKind::Page);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, RecordKind::Page);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let hub = ChangeHub::default();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        hub.publish(RecordKind::PageElement);

        assert_eq!(rx1.recv().await.unwrap().kind, RecordKind::PageElement);
        assert_eq!(rx2.recv().await.unwrap().kind, RecordKind::PageElement);
    }

    #[test]
    fn test_publish_with_no_subscribers_does_not_panic() {
        let hub = ChangeHub::default();
        hub.publish(RecordKind::Setting);
    }
}
