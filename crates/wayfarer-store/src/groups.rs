//! CRUD operations for [`ChatGroup`] records.
//!
//! Member and admin id lists are persisted as JSON arrays in TEXT columns.
//! Deleting a group does NOT delete its messages; the caller owns that
//! cleanup.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use wayfarer_shared::types::{GroupId, MessageId, TravelerId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ChatGroup, Message};

const GROUP_COLUMNS: &str = "group_id, group_name, avatar_url, created_by, created_at,
    description, member_ids, admin_ids, last_message_id, last_message_time, unread_count";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert or replace a group by id.
    pub fn insert_group(&self, group: &ChatGroup) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO chat_groups
             (group_id, group_name, avatar_url, created_by, created_at,
              description, member_ids, admin_ids, last_message_id, last_message_time,
              unread_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                group.group_id.to_string(),
                group.group_name,
                group.avatar_url,
                group.created_by.as_str(),
                group.created_at.to_rfc3339(),
                group.description,
                serde_json::to_string(&group.member_ids)?,
                serde_json::to_string(&group.admin_ids)?,
                group.last_message_id.map(|m| m.to_string()),
                group.last_message_time.to_rfc3339(),
                group.unread_count,
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single group by id.
    pub fn get_group(&self, id: GroupId) -> Result<ChatGroup> {
        self.conn()
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM chat_groups WHERE group_id = ?1"),
                params![id.to_string()],
                row_to_group,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all groups, most recently active first.
    pub fn list_groups(&self) -> Result<Vec<ChatGroup>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM chat_groups
             ORDER BY last_message_time DESC"
        ))?;

        let rows = stmt.query_map([], row_to_group)?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Move the denormalized last-message pointer.
    pub fn set_last_message(
        &self,
        group_id: GroupId,
        message_id: MessageId,
        time: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "UPDATE chat_groups SET last_message_id = ?1, last_message_time = ?2
             WHERE group_id = ?3",
            params![
                message_id.to_string(),
                time.to_rfc3339(),
                group_id.to_string()
            ],
        )?;
        Ok(())
    }

    /// Overwrite the global unread counter.
    pub fn set_unread_count(&self, group_id: GroupId, count: u32) -> Result<()> {
        self.conn().execute(
            "UPDATE chat_groups SET unread_count = ?1 WHERE group_id = ?2",
            params![count, group_id.to_string()],
        )?;
        Ok(())
    }

    /// Append a group message and move the last-message pointer in one
    /// transaction; both land or neither does.
    pub fn append_group_message(&mut self, message: &Message) -> Result<()> {
        let group_id = message.group_id.ok_or(StoreError::InvalidRecipient)?;
        if message.receiver_id.is_some() {
            return Err(StoreError::InvalidRecipient);
        }

        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO messages
             (message_id, sender_id, receiver_id, group_id, content, kind,
              timestamp, is_read, is_recalled, media_url, is_sent_to_cloud, is_ai_message)
             VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                message.message_id.to_string(),
                message.sender_id.as_str(),
                group_id.to_string(),
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

        tx.execute(
            "UPDATE chat_groups SET last_message_id = ?1, last_message_time = ?2
             WHERE group_id = ?3",
            params![
                message.message_id.to_string(),
                message.timestamp.to_rfc3339(),
                group_id.to_string()
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a group by id.  Member messages are NOT cascaded; callers
    /// that want them gone must delete them separately.  Returns `true`
    /// if a row was deleted.
    pub fn delete_group(&self, id: GroupId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM chat_groups WHERE group_id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`ChatGroup`].
fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatGroup> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(4)?;
    let members_json: String = row.get(6)?;
    let admins_json: String = row.get(7)?;
    let last_id_str: Option<String> = row.get(8)?;
    let last_time_str: String = row.get(9)?;

    let group_id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let member_ids: Vec<TravelerId> = serde_json::from_str(&members_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let admin_ids: Vec<TravelerId> = serde_json::from_str(&admins_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let last_message_id = last_id_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let last_message_time: DateTime<Utc> = DateTime::parse_from_rfc3339(&last_time_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ChatGroup {
        group_id: GroupId(group_id),
        group_name: row.get(1)?,
        avatar_url: row.get(2)?,
        created_by: TravelerId::new(row.get::<_, String>(3)?),
        created_at,
        description: row.get(5)?,
        member_ids,
        admin_ids,
        last_message_id: last_message_id.map(MessageId),
        last_message_time,
        unread_count: row.get(10)?,
    })
}
