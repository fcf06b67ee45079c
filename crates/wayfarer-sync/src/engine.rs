//! The sync run itself: snapshot the unsynced backlog, attempt delivery,
//! latch the sync flag on success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use wayfarer_store::Database;

use crate::config::SyncConfig;
use crate::remote::{CloudEndpoint, NetworkMonitor};

/// Result of a single sync run, reported back to the host scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The backlog snapshot was processed.  `failed` messages stay
    /// unsynced and are picked up again by the next run.
    Completed { delivered: usize, failed: usize },
    /// The run could not proceed (e.g. store unreachable) and should be
    /// rescheduled wholesale.
    Retry,
    /// Unrecoverable state; rescheduling will not help.
    Fatal,
    /// Nothing was attempted: offline, or another run is in flight.
    Skipped,
}

/// Drains unsynced messages to the remote endpoint.
///
/// This engine is the only writer of the `is_sent_to_cloud` latch.  At
/// most one run is in flight at a time; triggers that arrive while a run
/// is active are coalesced into [`SyncOutcome::Skipped`].
pub struct SyncEngine {
    db: Arc<Mutex<Database>>,
    endpoint: Arc<dyn CloudEndpoint>,
    network: Arc<dyn NetworkMonitor>,
    config: SyncConfig,
    in_flight: AtomicBool,
}

impl SyncEngine {
    pub fn new(
        db: Arc<Mutex<Database>>,
        endpoint: Arc<dyn CloudEndpoint>,
        network: Arc<dyn NetworkMonitor>,
        config: SyncConfig,
    ) -> Self {
        Self {
            db,
            endpoint,
            network,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute one sync run.
    ///
    /// The unsynced set is snapshotted at entry; each message gets one
    /// bounded delivery attempt.  Per-message failures never abort the
    /// run: the remaining snapshot is still attempted and the failed
    /// messages simply stay eligible for the next run.
    pub async fn run_once(&self) -> SyncOutcome {
        if !self.network.is_connected() {
            debug!("sync skipped: no network connectivity");
            return SyncOutcome::Skipped;
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("sync skipped: another run is in flight");
            return SyncOutcome::Skipped;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let snapshot = {
            let db = match self.db.lock() {
                Ok(db) => db,
                Err(_) => {
                    warn!("sync aborted: store lock poisoned");
                    return SyncOutcome::Fatal;
                }
            };
            match db.unsynced_messages() {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(error = %e, "sync run failed to snapshot backlog");
                    return SyncOutcome::Retry;
                }
            }
        };

        if snapshot.is_empty() {
            return SyncOutcome::Completed {
                delivered: 0,
                failed: 0,
            };
        }

        debug!(backlog = snapshot.len(), "sync run starting");

        let mut delivered = 0usize;
        let mut failed = 0usize;

        for message in &snapshot {
            match timeout(self.config.delivery_timeout, self.endpoint.deliver(message)).await {
                Ok(Ok(())) => {
                    let latched = self
                        .db
                        .lock()
                        .ok()
                        .map(|db| db.mark_synced(message.message_id));
                    match latched {
                        Some(Ok(())) => delivered += 1,
                        Some(Err(e)) => {
                            warn!(msg_id = %message.message_id, error = %e,
                                "delivered but failed to latch sync flag");
                            failed += 1;
                        }
                        None => {
                            warn!("store lock poisoned mid-run");
                            return SyncOutcome::Fatal;
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(msg_id = %message.message_id, error = %e, "delivery failed");
                    failed += 1;
                }
                Err(_) => {
                    warn!(msg_id = %message.message_id, "delivery timed out");
                    failed += 1;
                }
            }
        }

        info!(delivered, failed, "sync run finished");
        SyncOutcome::Completed { delivered, failed }
    }
}

/// Clears the in-flight marker on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
