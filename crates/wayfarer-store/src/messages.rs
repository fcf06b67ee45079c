//! CRUD and query operations for [`Message`] records.
//!
//! Flag columns behave as one-way latches: `is_read`, `is_recalled` and
//! `is_sent_to_cloud` are only ever set to 1 here, so none of these
//! operations can reverse a flip.  `is_sent_to_cloud` is written
//! exclusively by the sync engine through [`Database::mark_synced`].

use chrono::{DateTime, Utc};
use rusqlite::params;

use wayfarer_shared::types::{GroupId, MessageId, MessageKind, TravelerId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;

const MESSAGE_COLUMNS: &str = "message_id, sender_id, receiver_id, group_id, content, kind,
    timestamp, is_read, is_recalled, media_url, is_sent_to_cloud, is_ai_message";

impl Database {
    /// Insert or replace a message by id.
    ///
    /// Rejects rows that violate the recipient invariant (exactly one of
    /// receiver or group must be set).
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        if message.receiver_id.is_some() == message.group_id.is_some() {
            return Err(StoreError::InvalidRecipient);
        }

        self.conn().execute(
            "INSERT OR REPLACE INTO messages
             (message_id, sender_id, receiver_id, group_id, content, kind,
              timestamp, is_read, is_recalled, media_url, is_sent_to_cloud, is_ai_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                message.message_id.to_string(),
                message.sender_id.as_str(),
                message.receiver_id.as_ref().map(|r| r.as_str()),
                message.group_id.map(|g| g.to_string()),
                message.content,
                message.kind.as_str(),
                message.timestamp.to_rfc3339(),
                message.is_read,
                message.is_recalled,
                message.media_url,
                message.is_sent_to_cloud,
                message.is_ai_message,
            ],
        )?;
        Ok(())
    }

    /// Fetch a single message by id.
    pub fn get_message(&self, id: MessageId) -> Result<Message> {
        self.conn()
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"),
                params![id.to_string()],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// All messages exchanged between two travelers, in either direction,
    /// ordered by timestamp ascending.  Symmetric in its arguments.
    pub fn direct_messages(&self, a: &TravelerId, b: &TravelerId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_id = ?1 AND receiver_id = ?2)
                OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY timestamp ASC"
        ))?;

        let rows = stmt.query_map(params![a.as_str(), b.as_str()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// All messages of a group, ordered by timestamp ascending.
    pub fn group_messages(&self, group_id: GroupId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE group_id = ?1
             ORDER BY timestamp ASC"
        ))?;

        let rows = stmt.query_map(params![group_id.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Unread messages addressed directly to `viewer`.
    pub fn unread_messages(&self, viewer: &TravelerId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE receiver_id = ?1 AND is_read = 0
             ORDER BY timestamp ASC"
        ))?;

        let rows = stmt.query_map(params![viewer.as_str()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Flip `is_read` for every message from `counterparty` to `viewer`.
    /// A single bulk UPDATE, so the batch is atomic; re-invocation is a
    /// no-op on already-read rows.  Returns the number of newly read rows.
    pub fn mark_read(&self, viewer: &TravelerId, counterparty: &TravelerId) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE messages SET is_read = 1
             WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
            params![viewer.as_str(), counterparty.as_str()],
        )?;
        Ok(affected)
    }

    /// Set the recall flag.  Idempotent; the content column is retained.
    /// Eligibility (sender + time window) is enforced by the caller.
    pub fn recall_message(&self, id: MessageId) -> Result<()> {
        self.conn().execute(
            "UPDATE messages SET is_recalled = 1 WHERE message_id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// Messages not yet acknowledged by the cloud.  Used exclusively by
    /// the sync engine.
    pub fn unsynced_messages(&self) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE is_sent_to_cloud = 0
             ORDER BY timestamp ASC"
        ))?;

        let rows = stmt.query_map([], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Latch the sync flag.  One-way and idempotent.
    pub fn mark_synced(&self, id: MessageId) -> Result<()> {
        self.conn().execute(
            "UPDATE messages SET is_sent_to_cloud = 1 WHERE message_id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }

    /// Explicit user deletion, independent of recall.  Returns `true` if
    /// a row was deleted.
    pub fn delete_message(&self, id: MessageId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM messages WHERE message_id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// All AI-conversation messages involving `traveler_id`, ordered by
    /// timestamp ascending.
    pub fn ai_messages(&self, traveler_id: &TravelerId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE is_ai_message = 1 AND (sender_id = ?1 OR receiver_id = ?1)
             ORDER BY timestamp ASC"
        ))?;

        let rows = stmt.query_map(params![traveler_id.as_str()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

/// Map a `rusqlite::Row` to a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let sender: String = row.get(1)?;
    let receiver: Option<String> = row.get(2)?;
    let group_str: Option<String> = row.get(3)?;
    let kind_str: String = row.get(5)?;
    let ts_str: String = row.get(6)?;

    let message_id = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let group_id = group_str
        .map(|s| uuid::Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let kind = MessageKind::from_str(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown message kind: {kind_str}").into(),
        )
    })?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Message {
        message_id: MessageId(message_id),
        sender_id: TravelerId::new(sender),
        receiver_id: receiver.map(TravelerId::new),
        group_id: group_id.map(GroupId),
        content: row.get(4)?,
        kind,
        timestamp,
        is_read: row.get(7)?,
        is_recalled: row.get(8)?,
        media_url: row.get(9)?,
        is_sent_to_cloud: row.get(10)?,
        is_ai_message: row.get(11)?,
    })
}
