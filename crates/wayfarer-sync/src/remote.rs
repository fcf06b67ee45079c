//! Boundary traits towards the outside world: the cloud endpoint that
//! accepts message deliveries, and the network availability gate.

use async_trait::async_trait;

use wayfarer_store::Message;

use crate::error::SyncError;

/// An opaque remote endpoint that accepts message deliveries.
///
/// Delivery is at-least-once: the engine may hand over the same message
/// again after a failure, and the remote side deduplicates on the
/// client-generated message id.
#[async_trait]
pub trait CloudEndpoint: Send + Sync {
    async fn deliver(&self, message: &Message) -> Result<(), SyncError>;
}

/// Reports whether the device currently has network connectivity.
/// Both scheduled and on-demand runs are gated on this.
pub trait NetworkMonitor: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// A monitor that always reports connectivity.  Useful for platforms
/// without a native reachability signal, and for tests.
pub struct AlwaysOnline;

impl NetworkMonitor for AlwaysOnline {
    fn is_connected(&self) -> bool {
        true
    }
}
