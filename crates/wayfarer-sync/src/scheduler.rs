//! Periodic scheduling on top of [`SyncEngine::run_once`].
//!
//! The scheduler owns a single background task: a timer loop that fires a
//! run every interval and a shutdown signal that stops future runs.  An
//! in-flight run is never interrupted by `stop`; the signal is observed
//! between runs.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{SyncEngine, SyncOutcome};

/// Drives scheduled and on-demand sync runs.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            shutdown: None,
            handle: None,
        }
    }

    /// Start the periodic loop.  The first run fires immediately, then
    /// every configured interval.  A no-op if already started.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        let engine = self.engine.clone();
        let period = engine.config().interval;

        info!(interval_secs = period.as_secs(), "starting periodic sync");

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = interval.tick() => {
                        let outcome = engine.run_once().await;
                        debug!(?outcome, "scheduled sync run finished");
                    }
                }
            }
            debug!("periodic sync stopped");
        });

        self.shutdown = Some(tx);
        self.handle = Some(handle);
    }

    /// Stop future scheduled runs.  A run already in flight completes
    /// normally.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        self.handle.take();
    }

    /// Whether the periodic loop is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Trigger an immediate run, subject to the same connectivity gate
    /// and single-run coalescing as scheduled runs.
    pub async fn sync_now(&self) -> SyncOutcome {
        self.engine.run_once().await
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use wayfarer_shared::types::{MessageKind, TravelerId};
    use wayfarer_store::{Database, Message};

    use crate::config::SyncConfig;
    use crate::error::SyncError;
    use crate::remote::{AlwaysOnline, CloudEndpoint};

    struct AcceptAll;

    #[async_trait]
    impl CloudEndpoint for AcceptAll {
        async fn deliver(&self, _message: &Message) -> Result<(), SyncError> {
            Ok(())
        }
    }

    fn setup(dir: &tempfile::TempDir) -> (Arc<Mutex<Database>>, Arc<SyncEngine>) {
        let db = Arc::new(Mutex::new(
            Database::open_at(&dir.path().join("test.db")).unwrap(),
        ));
        let engine = Arc::new(SyncEngine::new(
            db.clone(),
            Arc::new(AcceptAll),
            Arc::new(AlwaysOnline),
            SyncConfig {
                interval: Duration::from_secs(900),
                ..SyncConfig::default()
            },
        ));
        (db, engine)
    }

    fn pending_message(db: &Arc<Mutex<Database>>, content: &str) -> Message {
        let msg = Message::direct(
            TravelerId::new("a"),
            TravelerId::new("b"),
            content,
            MessageKind::Text,
        );
        db.lock().unwrap().insert_message(&msg).unwrap();
        msg
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_loop_drains_and_stop_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let (db, engine) = setup(&dir);
        pending_message(&db, "queued before start");

        let mut scheduler = SyncScheduler::new(engine);
        scheduler.start();
        assert!(scheduler.is_running());

        // the first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(db.lock().unwrap().unsynced_messages().unwrap().is_empty());

        scheduler.stop();
        assert!(!scheduler.is_running());

        // after stop, new backlog is no longer drained by the timer
        pending_message(&db, "queued after stop");
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(db.lock().unwrap().unsynced_messages().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn on_demand_run() {
        let dir = tempfile::tempdir().unwrap();
        let (db, engine) = setup(&dir);
        pending_message(&db, "push it now");

        let scheduler = SyncScheduler::new(engine);
        let outcome = scheduler.sync_now().await;
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                delivered: 1,
                failed: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, engine) = setup(&dir);

        let mut scheduler = SyncScheduler::new(engine);
        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop();
    }
}
