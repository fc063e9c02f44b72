use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// The single message type pushed to connected clients.
///
/// Serialized as `{"type":"update","key":...,"value":...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    Update { key: String, value: String },
}

/// Connection registry for the live-update fan-out.
///
/// Subscribing hands out a receiver; dropping the receiver is the
/// unsubscribe. Publishing is fire-and-forget: no acknowledgment, no retry,
/// and a subscriber that has overflowed the channel capacity is cut loose by
/// its own connection task on the next `Lagged` error.
///
/// This is an injected object rather than a process-wide global so tests can
/// hold their own receivers and count deliveries.
#[derive(Clone)]
pub struct UpdateBroadcaster {
    tx: broadcast::Sender<PushMessage>,
}

impl UpdateBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.tx.subscribe()
    }

    /// Enqueue an update event to every currently registered subscriber.
    ///
    /// A send with zero subscribers is not an error.
    pub fn publish(&self, key: &str, value: &str) {
        let _ = self.tx.send(PushMessage::Update {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Number of currently open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
