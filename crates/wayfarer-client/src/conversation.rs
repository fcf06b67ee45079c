//! Message lifecycle rules.
//!
//! Three independent axes per message:
//! delivery (`Draft` -> `PendingSync` -> `Synced`), read (`Unread` ->
//! `Read`) and recall (`Active` -> `Recalled`).  All transitions are
//! one-way; recall is additionally gated on sender identity and a fixed
//! time window.  A freshly persisted row is immediately pending sync.

use chrono::{DateTime, Utc};
use thiserror::Error;

use wayfarer_shared::constants::RECALL_WINDOW_SECS;
use wayfarer_shared::types::TravelerId;
use wayfarer_store::Message;

/// Delivery axis of the message lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Constructed client-side, no row yet.
    Draft,
    /// Persisted but not yet acknowledged by the cloud.
    PendingSync,
    /// Acknowledged by the cloud.  Terminal for this axis.
    Synced,
}

/// Delivery state of a message; `persisted` says whether the row exists
/// in the store.
pub fn delivery_state(message: &Message, persisted: bool) -> DeliveryState {
    if !persisted {
        DeliveryState::Draft
    } else if message.is_sent_to_cloud {
        DeliveryState::Synced
    } else {
        DeliveryState::PendingSync
    }
}

/// Why a recall attempt was rejected.  Reported to the caller, never
/// fatal; the recall flag stays untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallRejected {
    #[error("Only the original sender may recall a message")]
    NotSender,

    #[error("The recall window has elapsed")]
    WindowElapsed,

    #[error("Message is already recalled")]
    AlreadyRecalled,
}

/// Recall eligibility: only the original sender, only within the policy
/// window from the send timestamp, and only once.
pub fn check_recall(
    message: &Message,
    caller: &TravelerId,
    now: DateTime<Utc>,
) -> Result<(), RecallRejected> {
    if message.sender_id != *caller {
        return Err(RecallRejected::NotSender);
    }
    if message.is_recalled {
        return Err(RecallRejected::AlreadyRecalled);
    }
    let age = now.signed_duration_since(message.timestamp);
    if age.num_seconds() > RECALL_WINDOW_SECS {
        return Err(RecallRejected::WindowElapsed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use wayfarer_shared::types::MessageKind;

    fn message() -> Message {
        Message::direct(
            TravelerId::new("a"),
            TravelerId::new("b"),
            "hasty words",
            MessageKind::Text,
        )
    }

    #[test]
    fn sender_within_window_may_recall() {
        let msg = message();
        assert_eq!(
            check_recall(&msg, &TravelerId::new("a"), Utc::now()),
            Ok(())
        );
    }

    #[test]
    fn non_sender_is_rejected() {
        let msg = message();
        assert_eq!(
            check_recall(&msg, &TravelerId::new("b"), Utc::now()),
            Err(RecallRejected::NotSender)
        );
    }

    #[test]
    fn elapsed_window_is_rejected() {
        let msg = message();
        let late = msg.timestamp + Duration::seconds(RECALL_WINDOW_SECS + 1);
        assert_eq!(
            check_recall(&msg, &TravelerId::new("a"), late),
            Err(RecallRejected::WindowElapsed)
        );

        // right at the edge the recall still goes through
        let edge = msg.timestamp + Duration::seconds(RECALL_WINDOW_SECS);
        assert_eq!(check_recall(&msg, &TravelerId::new("a"), edge), Ok(()));
    }

    #[test]
    fn double_recall_is_rejected() {
        let mut msg = message();
        msg.is_recalled = true;
        assert_eq!(
            check_recall(&msg, &TravelerId::new("a"), Utc::now()),
            Err(RecallRejected::AlreadyRecalled)
        );
    }

    #[test]
    fn delivery_axis() {
        let mut msg = message();
        assert_eq!(delivery_state(&msg, false), DeliveryState::Draft);
        assert_eq!(delivery_state(&msg, true), DeliveryState::PendingSync);
        msg.is_sent_to_cloud = true;
        assert_eq!(delivery_state(&msg, true), DeliveryState::Synced);
    }
}
