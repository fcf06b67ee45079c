//! v001 -- Initial schema creation.
//!
//! Creates the three core tables (`users`, `messages`, `chat_groups`) and
//! the `settings` key-value area.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    traveler_id        TEXT PRIMARY KEY NOT NULL,
    username           TEXT NOT NULL,
    avatar_url         TEXT,
    avatar_accessory   TEXT,
    encrypted_password TEXT NOT NULL,          -- vault ciphertext, base64
    token              TEXT,                   -- current session token
    is_online          INTEGER NOT NULL DEFAULT 0,
    last_seen          TEXT NOT NULL,          -- ISO-8601 / RFC-3339
    public_key         TEXT                    -- reserved
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    message_id       TEXT PRIMARY KEY NOT NULL,  -- UUID v4, client-generated
    sender_id        TEXT NOT NULL,
    receiver_id      TEXT,                       -- null for group messages
    group_id         TEXT,                       -- null for direct messages
    content          TEXT NOT NULL,
    kind             TEXT NOT NULL,              -- TEXT / IMAGE / VOICE / ...
    timestamp        TEXT NOT NULL,              -- ISO-8601
    is_read          INTEGER NOT NULL DEFAULT 0,
    is_recalled      INTEGER NOT NULL DEFAULT 0,
    media_url        TEXT,
    is_sent_to_cloud INTEGER NOT NULL DEFAULT 0,
    is_ai_message    INTEGER NOT NULL DEFAULT 0,

    CHECK ((receiver_id IS NULL) != (group_id IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_messages_direct
    ON messages(sender_id, receiver_id, timestamp);

CREATE INDEX IF NOT EXISTS idx_messages_group_ts
    ON messages(group_id, timestamp);

CREATE INDEX IF NOT EXISTS idx_messages_unsynced
    ON messages(is_sent_to_cloud) WHERE is_sent_to_cloud = 0;

-- ----------------------------------------------------------------
-- Chat groups
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chat_groups (
    group_id          TEXT PRIMARY KEY NOT NULL, -- UUID v4
    group_name        TEXT NOT NULL,
    avatar_url        TEXT,
    created_by        TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    description       TEXT,
    member_ids        TEXT NOT NULL,             -- JSON array of traveler ids
    admin_ids         TEXT NOT NULL,             -- JSON array of traveler ids
    last_message_id   TEXT,
    last_message_time TEXT NOT NULL,
    unread_count      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_chat_groups_last_message
    ON chat_groups(last_message_time DESC);

-- ----------------------------------------------------------------
-- Settings (session token, current identity, launch flags, ...)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
