//! # wayfarer-client
//!
//! The command layer of the Wayfarer chat client: everything the
//! presentation layer may ask the core to do (register, login, send,
//! mark read, recall, create groups, ...) plus the conversation
//! lifecycle rules and the pluggable AI responder.
//!
//! The store handle is constructed explicitly by the host process and
//! passed in through [`state::AppState`]; there is no lazily initialised
//! global anywhere.

pub mod commands;
pub mod conversation;
pub mod events;
pub mod responder;
pub mod state;

mod error;

pub use error::ClientError;
pub use state::AppState;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.  Call once at process start.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("wayfarer_client=debug,wayfarer_sync=debug,wayfarer_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
