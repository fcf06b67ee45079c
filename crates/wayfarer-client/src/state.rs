//! Application state shared across all client commands.
//!
//! [`AppState`] is constructed once by the host process and handed to
//! every collaborator; its lifecycle is owned by the process entry
//! point.  The store sits behind a mutex so the interactive command
//! path and the background sync engine serialize their row writes.

use std::sync::{Arc, Mutex, MutexGuard};

use wayfarer_shared::constants::{KDF_CONTEXT_TOKEN_KEY, KDF_CONTEXT_VAULT_KEY};
use wayfarer_shared::session::SessionManager;
use wayfarer_shared::vault::{derive_key, KeyProvider, Vault};
use wayfarer_store::Database;
use wayfarer_sync::{CloudEndpoint, NetworkMonitor, SyncConfig, SyncEngine, SyncScheduler};

use crate::error::ClientError;
use crate::events::EventBus;
use crate::responder::{KeywordResponder, Responder};

/// Central application state.
pub struct AppState {
    db: Arc<Mutex<Database>>,
    vault: Vault,
    sessions: SessionManager,
    responder: Arc<dyn Responder>,
    events: EventBus,
}

impl AppState {
    /// Build the state from an opened store and the device key provider.
    ///
    /// The vault key and the token signing key are both derived from the
    /// device-bound key under separate BLAKE3 contexts, so rotating the
    /// device key invalidates stored password blobs and sessions alike.
    pub fn new(db: Database, keys: &dyn KeyProvider) -> Result<Self, ClientError> {
        let device_key = keys.device_key()?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            vault: Vault::new(derive_key(&device_key, KDF_CONTEXT_VAULT_KEY)),
            sessions: SessionManager::new(derive_key(&device_key, KDF_CONTEXT_TOKEN_KEY)),
            responder: Arc::new(KeywordResponder),
            events: EventBus::new(),
        })
    }

    /// Swap in a different AI responder (e.g. a real backend).
    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = responder;
        self
    }

    /// Lock the store for one operation.
    pub(crate) fn db(&self) -> Result<MutexGuard<'_, Database>, ClientError> {
        self.db
            .lock()
            .map_err(|_| ClientError::Internal("store lock poisoned".to_string()))
    }

    /// Shared handle to the store, for wiring external collaborators.
    pub fn db_handle(&self) -> Arc<Mutex<Database>> {
        self.db.clone()
    }

    pub(crate) fn vault(&self) -> &Vault {
        &self.vault
    }

    pub(crate) fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub(crate) fn responder(&self) -> &dyn Responder {
        self.responder.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Wire up the sync engine against this store and start its periodic
    /// schedule.  The returned scheduler stops future runs when dropped.
    pub fn start_sync(
        &self,
        endpoint: Arc<dyn CloudEndpoint>,
        network: Arc<dyn NetworkMonitor>,
        config: SyncConfig,
    ) -> SyncScheduler {
        let engine = Arc::new(SyncEngine::new(self.db_handle(), endpoint, network, config));
        let mut scheduler = SyncScheduler::new(engine);
        scheduler.start();
        scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use wayfarer_shared::types::{MessageKind, TravelerId};
    use wayfarer_store::Message;
    use wayfarer_sync::{AlwaysOnline, SyncError};

    use crate::commands::messaging::send_direct;
    use crate::testutil::test_state;

    struct AcceptAll;

    #[async_trait]
    impl CloudEndpoint for AcceptAll {
        async fn deliver(&self, _message: &Message) -> Result<(), SyncError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn background_sync_latches_sent_messages() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let id = send_direct(
            &state,
            &TravelerId::new("a"),
            &TravelerId::new("b"),
            "see you at the pass",
            MessageKind::Text,
            None,
        )
        .unwrap();
        assert!(!state.db().unwrap().get_message(id).unwrap().is_sent_to_cloud);

        let mut scheduler = state.start_sync(
            Arc::new(AcceptAll),
            Arc::new(AlwaysOnline),
            SyncConfig::default(),
        );

        // the first scheduled run fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(state.db().unwrap().get_message(id).unwrap().is_sent_to_cloud);

        scheduler.stop();
    }
}
