//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wayfarer_shared::types::{GroupId, MessageId, MessageKind, TravelerId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A locally registered user.  The primary key is the traveler id chosen
/// at registration; it never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Immutable identity key.
    pub traveler_id: TravelerId,
    /// Display name.
    pub username: String,
    /// Optional avatar image URL.
    pub avatar_url: Option<String>,
    /// Optional avatar accessory identifier.
    pub avatar_accessory: Option<String>,
    /// Vault ciphertext of `"digest:salt"`.  Never a cleartext password,
    /// never a bare hash.
    pub encrypted_password: String,
    /// Current session token, if any.
    pub token: Option<String>,
    /// Whether the user is currently online.
    pub is_online: bool,
    /// Last presence update.
    pub last_seen: DateTime<Utc>,
    /// Reserved for future end-to-end key exchange.
    pub public_key: Option<String>,
}

impl User {
    /// A fresh offline user with no credentials attached yet.
    pub fn new(traveler_id: TravelerId, username: impl Into<String>) -> Self {
        Self {
            traveler_id,
            username: username.into(),
            avatar_url: None,
            avatar_accessory: None,
            encrypted_password: String::new(),
            token: None,
            is_online: false,
            last_seen: Utc::now(),
            public_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
///
/// Exactly one of `receiver_id` (direct) or `group_id` (group) is set.
/// The id and timestamp are assigned client-side at send time; the id
/// doubles as the idempotency key for cloud sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message identifier.
    pub message_id: MessageId,
    /// Traveler id of the sender.
    pub sender_id: TravelerId,
    /// Direct recipient; `None` for group messages.
    pub receiver_id: Option<TravelerId>,
    /// Owning group; `None` for direct messages.
    pub group_id: Option<GroupId>,
    /// Text payload; semantics depend on `kind`.
    pub content: String,
    /// Payload kind tag.
    pub kind: MessageKind,
    /// Creation time, assigned by the sender.
    pub timestamp: DateTime<Utc>,
    /// Read flag; flips false -> true once, never back.
    pub is_read: bool,
    /// Recall flag; one-way, content is retained underneath.
    pub is_recalled: bool,
    /// Media reference for image/voice kinds.
    pub media_url: Option<String>,
    /// Sync latch; written only by the sync engine.
    pub is_sent_to_cloud: bool,
    /// Whether this message was authored by the AI assistant.
    pub is_ai_message: bool,
}

impl Message {
    fn base(sender_id: TravelerId, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            message_id: MessageId::new(),
            sender_id,
            receiver_id: None,
            group_id: None,
            content: content.into(),
            kind,
            timestamp: Utc::now(),
            is_read: false,
            is_recalled: false,
            media_url: None,
            is_sent_to_cloud: false,
            is_ai_message: false,
        }
    }

    /// A new direct message from `sender_id` to `receiver_id`.
    pub fn direct(
        sender_id: TravelerId,
        receiver_id: TravelerId,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            receiver_id: Some(receiver_id),
            ..Self::base(sender_id, content, kind)
        }
    }

    /// A new group message from `sender_id` into `group_id`.
    pub fn group(
        sender_id: TravelerId,
        group_id: GroupId,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::base(sender_id, content, kind)
        }
    }

    /// Attach a media reference (image/voice payloads).
    pub fn with_media_url(mut self, media_url: impl Into<String>) -> Self {
        self.media_url = Some(media_url.into());
        self
    }
}

// ---------------------------------------------------------------------------
// ChatGroup
// ---------------------------------------------------------------------------

/// A group conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatGroup {
    /// Unique group identifier.
    pub group_id: GroupId,
    /// Human-readable group name.
    pub group_name: String,
    /// Optional avatar image URL.
    pub avatar_url: Option<String>,
    /// Traveler id of the creator.
    pub created_by: TravelerId,
    /// When the group was created.  Immutable.
    pub created_at: DateTime<Utc>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Ordered member ids.  Creation always includes the creator.
    pub member_ids: Vec<TravelerId>,
    /// Ordered admin ids.  Creation always includes the creator.
    pub admin_ids: Vec<TravelerId>,
    /// Denormalized pointer to the most recent message.
    pub last_message_id: Option<MessageId>,
    /// Timestamp of the most recent message; non-decreasing.
    pub last_message_time: DateTime<Utc>,
    /// Global unread counter (not per-member).
    pub unread_count: u32,
}

impl ChatGroup {
    /// A fresh group.  The creator is seeded as both member and admin.
    pub fn new(group_name: impl Into<String>, created_by: TravelerId) -> Self {
        let now = Utc::now();
        Self {
            group_id: GroupId::new(),
            group_name: group_name.into(),
            avatar_url: None,
            created_by: created_by.clone(),
            created_at: now,
            description: None,
            member_ids: vec![created_by.clone()],
            admin_ids: vec![created_by],
            last_message_id: None,
            last_message_time: now,
            unread_count: 0,
        }
    }

    /// Add a member, preserving order and uniqueness.
    pub fn add_member(&mut self, traveler_id: TravelerId) {
        if !self.member_ids.contains(&traveler_id) {
            self.member_ids.push(traveler_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_and_group_are_exclusive() {
        let direct = Message::direct(
            TravelerId::new("a"),
            TravelerId::new("b"),
            "hi",
            MessageKind::Text,
        );
        assert!(direct.receiver_id.is_some() && direct.group_id.is_none());

        let group = Message::group(
            TravelerId::new("a"),
            GroupId::new(),
            "hi all",
            MessageKind::Text,
        );
        assert!(group.group_id.is_some() && group.receiver_id.is_none());
    }

    #[test]
    fn new_group_seeds_creator() {
        let group = ChatGroup::new("hikers", TravelerId::new("a"));
        assert_eq!(group.member_ids, vec![TravelerId::new("a")]);
        assert_eq!(group.admin_ids, vec![TravelerId::new("a")]);
        assert_eq!(group.last_message_time, group.created_at);
    }

    #[test]
    fn add_member_deduplicates() {
        let mut group = ChatGroup::new("hikers", TravelerId::new("a"));
        group.add_member(TravelerId::new("b"));
        group.add_member(TravelerId::new("b"));
        assert_eq!(group.member_ids.len(), 2);
    }
}
