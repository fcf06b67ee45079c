//! Direct messaging: send, read receipts, recall, history queries.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use wayfarer_shared::types::{MessageId, MessageKind, RenderHint, TravelerId};
use wayfarer_store::Message;

use crate::conversation::{check_recall, delivery_state, DeliveryState};
use crate::error::ClientError;
use crate::events::ClientEvent;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub message_id: String,
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub group_id: Option<String>,
    pub content: String,
    pub kind: String,
    pub render_hint: RenderHint,
    pub timestamp: String,
    pub is_read: bool,
    pub is_recalled: bool,
    pub is_ai_message: bool,
    pub pending_sync: bool,
    pub media_url: Option<String>,
}

impl From<Message> for MessageDto {
    fn from(m: Message) -> Self {
        // recall suppresses what the consumer gets to display; the row
        // underneath still holds the content
        let (content, media_url) = if m.is_recalled {
            (String::new(), None)
        } else {
            (m.content.clone(), m.media_url.clone())
        };

        let pending_sync = delivery_state(&m, true) == DeliveryState::PendingSync;

        Self {
            message_id: m.message_id.to_string(),
            sender_id: m.sender_id.to_string(),
            receiver_id: m.receiver_id.map(|r| r.to_string()),
            group_id: m.group_id.map(|g| g.to_string()),
            content,
            kind: m.kind.as_str().to_string(),
            render_hint: m.kind.render_hint(),
            timestamp: m.timestamp.to_rfc3339(),
            is_read: m.is_read,
            is_recalled: m.is_recalled,
            is_ai_message: m.is_ai_message,
            pending_sync,
            media_url,
        }
    }
}

/// Send a direct message.  The id and timestamp are assigned here, on
/// the sending side.  Messages addressed to the assistant additionally
/// get a reply appended in the same call.
pub fn send_direct(
    state: &AppState,
    sender: &TravelerId,
    receiver: &TravelerId,
    content: &str,
    kind: MessageKind,
    media_url: Option<String>,
) -> Result<MessageId, ClientError> {
    if content.trim().is_empty() && media_url.is_none() {
        return Err(ClientError::Validation("message is empty".into()));
    }
    if kind.is_media() && media_url.is_none() {
        return Err(ClientError::Validation(
            "media messages need a media url".into(),
        ));
    }

    let mut message = Message::direct(sender.clone(), receiver.clone(), content, kind);
    if let Some(url) = media_url {
        message = message.with_media_url(url);
    }

    state.db()?.insert_message(&message)?;
    state.events().emit(ClientEvent::NewMessage {
        message_id: message.message_id,
        sender_id: message.sender_id.clone(),
        timestamp: message.timestamp,
    });

    info!(msg_id = %message.message_id, receiver = %receiver, "message sent");

    if receiver.is_assistant() {
        append_assistant_reply(state, sender, content)?;
    }

    Ok(message.message_id)
}

/// The assistant's turn: produce a reply and address it back to the
/// original sender, flagged as an AI message.
fn append_assistant_reply(
    state: &AppState,
    original_sender: &TravelerId,
    prompt: &str,
) -> Result<(), ClientError> {
    let reply_content = state.responder().reply_to(prompt);

    let mut reply = Message::direct(
        TravelerId::assistant(),
        original_sender.clone(),
        reply_content,
        MessageKind::Text,
    );
    reply.is_ai_message = true;

    state.db()?.insert_message(&reply)?;
    state.events().emit(ClientEvent::NewMessage {
        message_id: reply.message_id,
        sender_id: reply.sender_id.clone(),
        timestamp: reply.timestamp,
    });

    Ok(())
}

/// Flip the read flag on everything `counterparty` sent to `viewer`.
/// Returns how many messages were newly read.
pub fn mark_read(
    state: &AppState,
    viewer: &TravelerId,
    counterparty: &TravelerId,
) -> Result<usize, ClientError> {
    Ok(state.db()?.mark_read(viewer, counterparty)?)
}

/// Recall a message, subject to the lifecycle gate: sender only, within
/// the policy window, at most once.
pub fn recall(
    state: &AppState,
    caller: &TravelerId,
    message_id: MessageId,
) -> Result<(), ClientError> {
    let db = state.db()?;
    let message = db.get_message(message_id)?;

    check_recall(&message, caller, Utc::now())?;

    db.recall_message(message_id)?;
    state
        .events()
        .emit(ClientEvent::MessageRecalled { message_id });

    info!(msg_id = %message_id, "message recalled");
    Ok(())
}

/// Explicit deletion, independent of recall.
pub fn delete_message(state: &AppState, message_id: MessageId) -> Result<bool, ClientError> {
    Ok(state.db()?.delete_message(message_id)?)
}

/// Full direct history between two travelers, oldest first.  Symmetric
/// in its arguments.
pub fn direct_history(
    state: &AppState,
    a: &TravelerId,
    b: &TravelerId,
) -> Result<Vec<MessageDto>, ClientError> {
    let messages = state.db()?.direct_messages(a, b)?;
    Ok(messages.into_iter().map(MessageDto::from).collect())
}

/// Unread messages addressed to `viewer`.
pub fn unread(state: &AppState, viewer: &TravelerId) -> Result<Vec<MessageDto>, ClientError> {
    let messages = state.db()?.unread_messages(viewer)?;
    Ok(messages.into_iter().map(MessageDto::from).collect())
}

/// The viewer's AI conversation, oldest first.
pub fn ai_history(state: &AppState, viewer: &TravelerId) -> Result<Vec<MessageDto>, ClientError> {
    let messages = state.db()?.ai_messages(viewer)?;
    Ok(messages.into_iter().map(MessageDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use wayfarer_shared::constants::RECALL_WINDOW_SECS;

    use crate::conversation::RecallRejected;
    use crate::testutil::test_state;

    fn ids() -> (TravelerId, TravelerId) {
        (TravelerId::new("a"), TravelerId::new("b"))
    }

    #[test]
    fn send_persists_with_exclusive_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (a, b) = ids();

        let id = send_direct(&state, &a, &b, "hi", MessageKind::Text, None).unwrap();

        let stored = state.db().unwrap().get_message(id).unwrap();
        assert_eq!(stored.receiver_id, Some(b));
        assert!(stored.group_id.is_none());
        assert!(!stored.is_sent_to_cloud);
    }

    #[test]
    fn empty_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (a, b) = ids();

        assert!(matches!(
            send_direct(&state, &a, &b, "   ", MessageKind::Text, None),
            Err(ClientError::Validation(_))
        ));

        // a media message may carry an empty caption
        assert!(send_direct(
            &state,
            &a,
            &b,
            "",
            MessageKind::Image,
            Some("file:///trail.jpg".into())
        )
        .is_ok());

        // but a media kind without a media reference is malformed
        assert!(matches!(
            send_direct(&state, &a, &b, "listen", MessageKind::Voice, None),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn assistant_conversation_appends_reply() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let a = TravelerId::new("a");

        send_direct(
            &state,
            &a,
            &TravelerId::assistant(),
            "hello out there",
            MessageKind::Text,
            None,
        )
        .unwrap();

        let history = direct_history(&state, &a, &TravelerId::assistant()).unwrap();
        assert_eq!(history.len(), 2);

        let reply = &history[1];
        assert!(reply.is_ai_message);
        assert_eq!(reply.sender_id, "ai_assistant");
        assert_eq!(reply.receiver_id.as_deref(), Some("a"));

        let ai = ai_history(&state, &a).unwrap();
        assert_eq!(ai.len(), 1);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (a, b) = ids();

        send_direct(&state, &a, &b, "one", MessageKind::Text, None).unwrap();
        send_direct(&state, &a, &b, "two", MessageKind::Text, None).unwrap();

        assert_eq!(unread(&state, &b).unwrap().len(), 2);
        assert_eq!(mark_read(&state, &b, &a).unwrap(), 2);
        assert_eq!(mark_read(&state, &b, &a).unwrap(), 0);
        assert!(unread(&state, &b).unwrap().is_empty());
    }

    #[test]
    fn sender_recalls_within_window() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (a, b) = ids();

        let id = send_direct(&state, &a, &b, "oops", MessageKind::Text, None).unwrap();
        recall(&state, &a, id).unwrap();

        let dto = direct_history(&state, &a, &b).unwrap().remove(0);
        assert!(dto.is_recalled);
        assert!(dto.content.is_empty());

        // the row still holds the content underneath
        let row = state.db().unwrap().get_message(id).unwrap();
        assert_eq!(row.content, "oops");
    }

    #[test]
    fn recall_by_non_sender_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (a, b) = ids();

        let id = send_direct(&state, &a, &b, "mine", MessageKind::Text, None).unwrap();
        let result = recall(&state, &b, id);
        assert!(matches!(
            result,
            Err(ClientError::Recall(RecallRejected::NotSender))
        ));
        assert!(!state.db().unwrap().get_message(id).unwrap().is_recalled);
    }

    #[test]
    fn recall_after_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (a, b) = ids();

        let mut stale = Message::direct(a.clone(), b, "long ago", MessageKind::Text);
        stale.timestamp = Utc::now() - Duration::seconds(RECALL_WINDOW_SECS + 60);
        state.db().unwrap().insert_message(&stale).unwrap();

        let result = recall(&state, &a, stale.message_id);
        assert!(matches!(
            result,
            Err(ClientError::Recall(RecallRejected::WindowElapsed))
        ));
    }

    #[test]
    fn recall_of_missing_message_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        assert!(matches!(
            recall(&state, &TravelerId::new("a"), MessageId::new()),
            Err(ClientError::NotFound(_))
        ));
    }

    #[test]
    fn delete_removes_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let (a, b) = ids();

        let id = send_direct(&state, &a, &b, "temp", MessageKind::Text, None).unwrap();
        assert!(delete_message(&state, id).unwrap());
        assert!(direct_history(&state, &a, &b).unwrap().is_empty());
    }
}
