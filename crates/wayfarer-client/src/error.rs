use thiserror::Error;

use wayfarer_shared::{CryptoError, SessionError};
use wayfarer_store::StoreError;

use crate::conversation::RecallRejected;

/// Errors surfaced to the presentation layer.
///
/// `Validation` is never retried automatically; `Authentication` should
/// push the user back into the login flow; `NotFound` covers lookups
/// that are not allowed to miss.  Transient sync failures never appear
/// here; a message that could not reach the cloud simply stays pending.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Malformed input (empty credentials, blank message, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad password, invalid or expired token, or a vault decryption
    /// failure.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A required entity is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Recall policy violation; the flag stays untouched.
    #[error(transparent)]
    Recall(#[from] RecallRejected),

    /// Store failure; fatal to this operation only.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Unexpected internal state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ClientError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound("record not found".to_string()),
            other => Self::Store(other),
        }
    }
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailed => Self::Authentication(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<SessionError> for ClientError {
    fn from(e: SessionError) -> Self {
        Self::Authentication(e.to_string())
    }
}
