//! Key-value settings area.
//!
//! Holds the small pieces of client state that live outside the three
//! entity tables: session token, current-identity pointer, first-launch
//! flag, avatar path and cached profile fields.

use rusqlite::{params, OptionalExtension};

use wayfarer_shared::types::TravelerId;

use crate::database::Database;
use crate::error::Result;

pub const KEY_SESSION_TOKEN: &str = "session_token";
pub const KEY_CURRENT_TRAVELER: &str = "current_traveler_id";
pub const KEY_FIRST_LAUNCH_DONE: &str = "first_launch_done";
pub const KEY_AVATAR_PATH: &str = "avatar_path";
pub const KEY_PROFILE_USERNAME: &str = "profile_username";
pub const KEY_PROFILE_EMAIL: &str = "profile_email";
pub const KEY_PROFILE_BIO: &str = "profile_bio";

impl Database {
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Typed helpers
    // ------------------------------------------------------------------

    /// Persist the active session (token + identity pointer).
    pub fn save_session(&self, traveler_id: &TravelerId, token: &str) -> Result<()> {
        self.set_setting(KEY_CURRENT_TRAVELER, traveler_id.as_str())?;
        self.set_setting(KEY_SESSION_TOKEN, token)?;
        Ok(())
    }

    /// The stored session, if one exists.
    pub fn stored_session(&self) -> Result<Option<(TravelerId, String)>> {
        let traveler = self.get_setting(KEY_CURRENT_TRAVELER)?;
        let token = self.get_setting(KEY_SESSION_TOKEN)?;
        Ok(match (traveler, token) {
            (Some(t), Some(tok)) => Some((TravelerId::new(t), tok)),
            _ => None,
        })
    }

    /// Forget the active session (local logout).
    pub fn clear_session(&self) -> Result<()> {
        self.delete_setting(KEY_SESSION_TOKEN)?;
        self.delete_setting(KEY_CURRENT_TRAVELER)?;
        Ok(())
    }

    pub fn is_first_launch(&self) -> Result<bool> {
        Ok(self.get_setting(KEY_FIRST_LAUNCH_DONE)?.is_none())
    }

    pub fn mark_first_launch_done(&self) -> Result<()> {
        self.set_setting(KEY_FIRST_LAUNCH_DONE, "1")
    }
}
