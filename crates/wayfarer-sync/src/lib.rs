//! # wayfarer-sync
//!
//! Cloud synchronization for the local message store.
//!
//! The engine drains the store's unsynced backlog to an opaque remote
//! endpoint with at-least-once semantics; the client-generated message id
//! is the idempotency key on the remote side.  A run can be triggered on
//! a periodic schedule or on demand, both gated on network availability,
//! and only one run is ever in flight at a time.

pub mod config;
pub mod engine;
pub mod remote;
pub mod scheduler;

mod error;

pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncOutcome};
pub use error::SyncError;
pub use remote::{AlwaysOnline, CloudEndpoint, NetworkMonitor};
pub use scheduler::SyncScheduler;
