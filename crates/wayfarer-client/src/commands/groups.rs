//! Group conversations: creation, membership, group messaging.

use serde::Serialize;
use tracing::info;

use wayfarer_shared::types::{GroupId, MessageId, MessageKind, TravelerId};
use wayfarer_store::{ChatGroup, Message};

use crate::commands::messaging::MessageDto;
use crate::error::ClientError;
use crate::events::ClientEvent;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub group_id: String,
    pub group_name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub member_ids: Vec<String>,
    pub admin_ids: Vec<String>,
    pub last_message_id: Option<String>,
    pub last_message_time: String,
    pub unread_count: u32,
}

impl From<ChatGroup> for GroupDto {
    fn from(g: ChatGroup) -> Self {
        Self {
            group_id: g.group_id.to_string(),
            group_name: g.group_name,
            description: g.description,
            avatar_url: g.avatar_url,
            created_by: g.created_by.to_string(),
            created_at: g.created_at.to_rfc3339(),
            member_ids: g.member_ids.iter().map(|m| m.to_string()).collect(),
            admin_ids: g.admin_ids.iter().map(|a| a.to_string()).collect(),
            last_message_id: g.last_message_id.map(|m| m.to_string()),
            last_message_time: g.last_message_time.to_rfc3339(),
            unread_count: g.unread_count,
        }
    }
}

/// Create a group.  The creator always lands in both the member and the
/// admin list, regardless of the `members` argument.
pub fn create_group(
    state: &AppState,
    creator: &TravelerId,
    name: &str,
    members: &[TravelerId],
) -> Result<GroupId, ClientError> {
    if name.trim().is_empty() {
        return Err(ClientError::Validation("group name is required".into()));
    }

    let mut group = ChatGroup::new(name.trim(), creator.clone());
    for member in members {
        group.add_member(member.clone());
    }

    state.db()?.insert_group(&group)?;
    state.events().emit(ClientEvent::GroupCreated {
        group_id: group.group_id,
    });

    info!(group = %group.group_id, name = %group.group_name, "group created");
    Ok(group.group_id)
}

/// Send a message into a group.  The message row and the group's
/// last-message pointer move in the same store transaction.
pub fn send_group(
    state: &AppState,
    sender: &TravelerId,
    group_id: GroupId,
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

    let mut message = Message::group(sender.clone(), group_id, content, kind);
    if let Some(url) = media_url {
        message = message.with_media_url(url);
    }

    {
        let mut db = state.db()?;
        // surface a missing group as NotFound before writing anything
        db.get_group(group_id)?;
        db.append_group_message(&message)?;
    }

    state.events().emit(ClientEvent::NewMessage {
        message_id: message.message_id,
        sender_id: message.sender_id.clone(),
        timestamp: message.timestamp,
    });

    info!(msg_id = %message.message_id, group = %group_id, "group message sent");
    Ok(message.message_id)
}

/// Full message history of a group, oldest first.
pub fn group_history(state: &AppState, group_id: GroupId) -> Result<Vec<MessageDto>, ClientError> {
    let messages = state.db()?.group_messages(group_id)?;
    Ok(messages.into_iter().map(MessageDto::from).collect())
}

/// All groups, most recently active first.
pub fn chat_groups(state: &AppState) -> Result<Vec<GroupDto>, ClientError> {
    let groups = state.db()?.list_groups()?;
    Ok(groups.into_iter().map(GroupDto::from).collect())
}

/// Overwrite a group's global unread counter.
pub fn set_group_unread(
    state: &AppState,
    group_id: GroupId,
    count: u32,
) -> Result<(), ClientError> {
    Ok(state.db()?.set_unread_count(group_id, count)?)
}

/// Delete a group.  Messages belonging to it are NOT cascaded; a caller
/// that wants the history gone must delete those rows itself.
pub fn delete_group(state: &AppState, group_id: GroupId) -> Result<bool, ClientError> {
    Ok(state.db()?.delete_group(group_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;

    #[test]
    fn creator_is_member_and_admin() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let creator = TravelerId::new("a");
        let id = create_group(
            &state,
            &creator,
            "trail crew",
            &[TravelerId::new("b"), TravelerId::new("c")],
        )
        .unwrap();

        let group = state.db().unwrap().get_group(id).unwrap();
        assert_eq!(group.member_ids.len(), 3);
        assert_eq!(group.member_ids[0], creator);
        assert_eq!(group.admin_ids, vec![creator]);
    }

    #[test]
    fn blank_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        assert!(matches!(
            create_group(&state, &TravelerId::new("a"), "  ", &[]),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn group_send_moves_last_message_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let a = TravelerId::new("a");
        let id = create_group(&state, &a, "trail crew", &[TravelerId::new("b")]).unwrap();

        let msg_id = send_group(&state, &a, id, "summit at noon", MessageKind::Text, None).unwrap();

        let group = state.db().unwrap().get_group(id).unwrap();
        let msg = state.db().unwrap().get_message(msg_id).unwrap();
        assert_eq!(group.last_message_id, Some(msg_id));
        assert_eq!(group.last_message_time, msg.timestamp);

        let history = group_history(&state, id).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].receiver_id.is_none());
    }

    #[test]
    fn sending_into_missing_group_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        assert!(matches!(
            send_group(
                &state,
                &TravelerId::new("a"),
                GroupId::new(),
                "anyone here?",
                MessageKind::Text,
                None
            ),
            Err(ClientError::NotFound(_))
        ));
    }

    #[test]
    fn listing_orders_by_activity() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let a = TravelerId::new("a");
        let quiet = create_group(&state, &a, "quiet", &[]).unwrap();
        let noisy = create_group(&state, &a, "noisy", &[]).unwrap();
        send_group(&state, &a, noisy, "ping", MessageKind::Text, None).unwrap();

        let listed = chat_groups(&state).unwrap();
        assert_eq!(listed[0].group_id, noisy.to_string());
        assert_eq!(listed[1].group_id, quiet.to_string());
    }

    #[test]
    fn unread_counter_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let id = create_group(&state, &TravelerId::new("a"), "crew", &[]).unwrap();
        set_group_unread(&state, id, 4).unwrap();
        assert_eq!(state.db().unwrap().get_group(id).unwrap().unread_count, 4);
    }
}
