//! JSON snapshot file backend.
//!
//! The whole working set is written as one pretty-printed JSON document:
//!
//! ```json
//! { "timestamp": "2026-03-01T12:00:00Z", "items": [ { "identity": "...", ... } ] }
//! ```
//!
//! Writes go to a sibling temp file that is then renamed over the target,
//! so a crash mid-save leaves the previous snapshot intact.
//!
//! Default location: `<project>/.ctxwarden/cache/context_cache.json`

use async_trait::async_trait;
use ctxwarden_core::{PersistenceError, RawSnapshot, SnapshotBackend};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, reason: impl ToString) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotBackend for JsonSnapshotStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn load(&self) -> Result<Option<RawSnapshot>, PersistenceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let snapshot: RawSnapshot = serde_json::from_str(&content)
            .map_err(|e| self.io_error(format!("malformed snapshot: {e}")))?;
        debug!(path = %self.path.display(), items = snapshot.items.len(), "Snapshot file read");
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &RawSnapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(format!("failed to create snapshot directory: {e}")))?;
        }

        let body = serde_json::to_string_pretty(snapshot)
            .map_err(|e| PersistenceError::Encode(e.to_string()))?;

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, body).await.map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}
