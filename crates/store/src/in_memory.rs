//! In-memory snapshot backend, useful for tests and ephemeral sessions.

use async_trait::async_trait;
use ctxwarden_core::{PersistenceError, RawSnapshot, SnapshotBackend};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Holds at most one snapshot in memory. Every save replaces it.
pub struct InMemorySnapshotStore {
    snapshot: Arc<RwLock<Option<RawSnapshot>>>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(None)),
            saves: AtomicUsize::new(0),
            fail_saves: false,
        }
    }

    /// Start out holding `snapshot`, as if a previous session had saved it.
    pub fn with_snapshot(snapshot: RawSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Some(snapshot))),
            ..Self::new()
        }
    }

    /// A store whose saves always fail with an I/O error.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::new()
        }
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotBackend for InMemorySnapshotStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) -> Result<Option<RawSnapshot>, PersistenceError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &RawSnapshot) -> Result<(), PersistenceError> {
        if self.fail_saves {
            return Err(PersistenceError::Io {
                path: PathBuf::from("<memory>"),
                reason: "store rejects writes".into(),
            });
        }
        *self.snapshot.write().await = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
