//! Persistence of the single [`ResultSnapshot`].
//!
//! The snapshot lives under one fixed key and is always written wholesale.
//! Writes are last-writer-wins: two sessions sharing a backend silently
//! overwrite each other's updates. There is no version check.

pub mod backend;
pub mod sqlite;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use crate::config::{StorageBackendKind, StorageConfig};
use crate::errors::AttestError;
use crate::pipeline::state::ResultSnapshot;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use sqlite::SqliteBackend;

pub struct ResultStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl ResultStore {
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self { backend, key: key.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, AttestError> {
        let backend: Arc<dyn StorageBackend> = match config.backend {
            StorageBackendKind::File => Arc::new(FileBackend::new(&config.path)),
            StorageBackendKind::Sqlite => Arc::new(SqliteBackend::open(&config.path)?),
            StorageBackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(Self::new(backend, config.key.clone()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn describe(&self) -> String {
        format!("{} [{}]", self.backend.describe(), self.key)
    }

    /// Absent or unreadable snapshots both yield `None`; corruption is logged, not surfaced.
    pub async fn load(&self) -> Option<ResultSnapshot> {
        let text = match self.backend.read(&self.key).await {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read result snapshot");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unparseable result snapshot");
                None
            }
        }
    }

    /// Best-effort overwrite. Failures are logged and never returned.
    pub async fn save(&self, snapshot: &ResultSnapshot) {
        if let Err(e) = self.try_save(snapshot).await {
            warn!(key = %self.key, error = %e, category = %e.category(), "Failed to persist result snapshot");
        }
    }

    async fn try_save(&self, snapshot: &ResultSnapshot) -> Result<(), AttestError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| AttestError::Persistence(format!("serialize snapshot: {}", e)))?;
        self.backend.write(&self.key, &json).await?;
        debug!(key = %self.key, bytes = json.len(), "Result snapshot saved");
        Ok(())
    }
}

/// Owned handle to the session's snapshot.
///
/// Initialized on first access (loaded, or empty when absent or corrupt),
/// persists indefinitely across sessions, never torn down by the engine.
pub struct SnapshotHandle {
    store: ResultStore,
    snapshot: Mutex<ResultSnapshot>,
}

impl SnapshotHandle {
    pub async fn open(store: ResultStore) -> Self {
        let mut snapshot = store.load().await.unwrap_or_else(ResultSnapshot::empty);
        // Agents added since the snapshot was written start out pending
        for def in crate::agents::registry::AGENT_REGISTRY.iter() {
            snapshot.agents.entry(def.id).or_default();
        }
        Self { store, snapshot: Mutex::new(snapshot) }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub async fn current(&self) -> ResultSnapshot {
        self.snapshot.lock().await.clone()
    }

    /// Apply an in-memory change without persisting it.
    pub async fn mutate<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ResultSnapshot) -> R,
    {
        let mut guard = self.snapshot.lock().await;
        f(&mut guard)
    }

    /// Overwrite the persisted snapshot with the in-memory one.
    pub async fn persist(&self) {
        let guard = self.snapshot.lock().await;
        self.store.save(&guard).await;
    }

    /// Mutate then persist the whole snapshot.
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ResultSnapshot) -> R,
    {
        let mut guard = self.snapshot.lock().await;
        let out = f(&mut guard);
        self.store.save(&guard).await;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::registry::AgentId;
    use crate::pipeline::state::{AgentResult, AgentStatus, RunStatus};

    fn memory_store() -> (Arc<MemoryBackend>, ResultStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = ResultStore::new(backend.clone(), "attest-results");
        (backend, store)
    }

    #[tokio::test]
    async fn test_load_absent_is_none() {
        let (_, store) = memory_store();
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_is_none() {
        let (backend, store) = memory_store();
        backend.write("attest-results", "{ truncated").await.unwrap();
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (_, store) = memory_store();
        let mut snap = ResultSnapshot::empty();
        snap.run.status = RunStatus::Completed;
        let state = snap.agent_mut(AgentId::ScopeAnalyzer);
        state.result = Some(AgentResult::Whole("scope".into()));
        state.transition(AgentStatus::Completed);

        store.save(&snap).await;
        assert_eq!(store.load().await, Some(snap));
    }

    #[tokio::test]
    async fn test_handle_opens_empty_when_absent() {
        let (_, store) = memory_store();
        let handle = SnapshotHandle::open(store).await;
        let snap = handle.current().await;
        assert_eq!(snap, ResultSnapshot::empty());
    }

    #[tokio::test]
    async fn test_handle_update_persists() {
        let (_, store) = memory_store();
        let handle = SnapshotHandle::open(store).await;
        handle.update(|s| s.run.status = RunStatus::Running).await;

        let reloaded = handle.store().load().await.unwrap();
        assert_eq!(reloaded.run.status, RunStatus::Running);
    }

    #[tokio::test]
    async fn test_handle_mutate_does_not_persist() {
        let (_, store) = memory_store();
        let handle = SnapshotHandle::open(store).await;
        handle.mutate(|s| s.run.status = RunStatus::Running).await;
        assert!(handle.store().load().await.is_none());
        handle.persist().await;
        assert!(handle.store().load().await.is_some());
    }
}
