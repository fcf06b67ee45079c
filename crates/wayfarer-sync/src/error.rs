use thiserror::Error;

/// Errors produced by the sync layer.  All of these are transient from
/// the user's point of view: the affected messages simply stay pending
/// until a later run succeeds.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Remote endpoint unreachable or rejecting deliveries.
    #[error("Transient sync failure: {0}")]
    Transient(String),

    /// A single delivery attempt ran past its deadline.
    #[error("Delivery attempt timed out")]
    Timeout,

    /// The local store failed mid-run.
    #[error("Store error: {0}")]
    Store(#[from] wayfarer_store::StoreError),
}
