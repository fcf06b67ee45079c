//! # wayfarer-store
//!
//! Local durable storage for the Wayfarer chat client, backed by SQLite.
//!
//! The store is the single source of truth: users, messages and chat
//! groups live in three tables, plus a small key-value settings area for
//! session state.  Sensitive fields (the password blob) are encrypted at
//! the application layer by the credential vault before they reach a row.
//! The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection` with typed CRUD helpers for every domain model.

pub mod database;
pub mod groups;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod settings;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
