//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use wayfarer_shared::types::TravelerId;

use crate::database::Database;
use crate::error::Result;
use crate::models::User;

impl Database {
    /// Insert or replace a user by traveler id.
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO users
             (traveler_id, username, avatar_url, avatar_accessory, encrypted_password,
              token, is_online, last_seen, public_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.traveler_id.as_str(),
                user.username,
                user.avatar_url,
                user.avatar_accessory,
                user.encrypted_password,
                user.token,
                user.is_online,
                user.last_seen.to_rfc3339(),
                user.public_key,
            ],
        )?;
        Ok(())
    }

    /// Look up a user by traveler id.  A miss is a legitimate outcome
    /// (first login becomes a registration), so this returns `None`
    /// rather than an error.
    pub fn find_user(&self, traveler_id: &TravelerId) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT traveler_id, username, avatar_url, avatar_accessory,
                        encrypted_password, token, is_online, last_seen, public_key
                 FROM users WHERE traveler_id = ?1",
                params![traveler_id.as_str()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all known users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT traveler_id, username, avatar_url, avatar_accessory,
                    encrypted_password, token, is_online, last_seen, public_key
             FROM users
             ORDER BY username ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// List users currently marked online.
    pub fn online_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT traveler_id, username, avatar_url, avatar_accessory,
                    encrypted_password, token, is_online, last_seen, public_key
             FROM users
             WHERE is_online = 1",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Update presence (online flag + last-seen timestamp).
    pub fn set_user_presence(
        &self,
        traveler_id: &TravelerId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET is_online = ?1, last_seen = ?2 WHERE traveler_id = ?3",
            params![is_online, last_seen.to_rfc3339(), traveler_id.as_str()],
        )?;
        Ok(())
    }

    /// Replace the stored session token (`None` clears it).
    pub fn set_user_token(&self, traveler_id: &TravelerId, token: Option<&str>) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET token = ?1 WHERE traveler_id = ?2",
            params![token, traveler_id.as_str()],
        )?;
        Ok(())
    }

    /// Administrative removal.  Dependent messages are NOT deleted.
    /// Returns `true` if a row was deleted.
    pub fn delete_user(&self, traveler_id: &TravelerId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM users WHERE traveler_id = ?1",
            params![traveler_id.as_str()],
        )?;
        Ok(affected > 0)
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let traveler_id: String = row.get(0)?;
    let last_seen_str: String = row.get(7)?;

    let last_seen: DateTime<Utc> = DateTime::parse_from_rfc3339(&last_seen_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        traveler_id: TravelerId::new(traveler_id),
        username: row.get(1)?,
        avatar_url: row.get(2)?,
        avatar_accessory: row.get(3)?,
        encrypted_password: row.get(4)?,
        token: row.get(5)?,
        is_online: row.get(6)?,
        last_seen,
        public_key: row.get(8)?,
    })
}
