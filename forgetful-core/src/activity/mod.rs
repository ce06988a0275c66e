//! Activity event bus (spec §4.M).
//!
//! Emits fire-and-forget events for memory/entity/project mutations (and,
//! when `Config::activity_track_reads` is set, reads too) to any attached
//! subscriber — a UI, an audit log. `tokio::sync::mpsc` has no native
//! drop-oldest behavior, so [`ActivityBus`] wraps a bounded channel and
//! discards the oldest buffered event itself when a send would block,
//! rather than ever blocking the caller that triggered the event.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The kind of mutation or read an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Updated,
    Obsoleted,
    Linked,
    Queried,
}

/// A single activity event.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub user_id: crate::types::UserId,
    pub entity_type: &'static str,
    pub entity_id: Option<crate::types::Id>,
    pub kind: ActivityKind,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// A bounded, drop-oldest event bus. Cloning shares the same underlying
/// channel, so every clone publishes to the same subscriber.
#[derive(Clone)]
pub struct ActivityBus {
    sender: mpsc::Sender<ActivityEvent>,
    overflow: Arc<Mutex<mpsc::Receiver<ActivityEvent>>>,
}

impl ActivityBus {
    /// Build a bus with a ring buffer of `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            overflow: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Publish an event. Never blocks or fails the caller: if the channel
    /// is full, the oldest buffered event is dropped to make room. If no
    /// subscriber currently holds the receiver lock, the event is silently
    /// skipped rather than waiting.
    pub fn publish(&self, event: ActivityEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                if let Some(mut receiver) = self.overflow.try_lock() {
                    let _dropped = receiver.try_recv();
                    drop(receiver);
                }
                let _ = self.sender.try_send(event);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Take the receiving half for a subscriber. Only one subscriber can
    /// hold the lock across an `.await` at a time; callers that need to
    /// read continuously should hold the returned guard for the lifetime
    /// of their receive loop.
    #[must_use]
    pub fn subscriber(&self) -> Arc<Mutex<mpsc::Receiver<ActivityEvent>>> {
        self.overflow.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(kind: ActivityKind) -> ActivityEvent {
        ActivityEvent {
            user_id: Uuid::nil(),
            entity_type: "memory",
            entity_id: Some(1),
            kind,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_delivers_to_subscriber() {
        let bus = ActivityBus::new(4);
        bus.publish(event(ActivityKind::Created));
        let receiver = bus.subscriber();
        let mut receiver = receiver.lock();
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.kind, ActivityKind::Created);
    }

    #[tokio::test]
    async fn publish_never_panics_when_full() {
        let bus = ActivityBus::new(1);
        bus.publish(event(ActivityKind::Created));
        bus.publish(event(ActivityKind::Updated));
        bus.publish(event(ActivityKind::Queried));
    }
}
