//! Client events for the external notification dispatcher.
//!
//! Consumers subscribe to a broadcast channel; emission never blocks and
//! never fails the operation that produced the event.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use wayfarer_shared::types::{GroupId, MessageId, TravelerId};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A message landed in the store (sent or AI reply).
    NewMessage {
        message_id: MessageId,
        sender_id: TravelerId,
        timestamp: DateTime<Utc>,
    },
    /// A message's content visibility was withdrawn by its sender.
    MessageRecalled { message_id: MessageId },
    /// A new group conversation exists.
    GroupCreated { group_id: GroupId },
}

/// Fan-out of client events to any number of subscribers.
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit an event.  Dropped silently when nobody is listening.
    pub fn emit(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
