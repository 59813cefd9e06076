//! Snapshot persistence trait and on-disk record shape.
//!
//! A snapshot is a timestamp plus one record per item. Records stay as raw
//! JSON values at this layer so that a single malformed record can be
//! discarded by the caller without losing the rest of the snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::item::Item;

/// A persisted working set, as stored by a `SnapshotBackend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// One record per item; each should decode as an [`Item`].
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

impl RawSnapshot {
    /// Encode a set of items taken at `timestamp`.
    pub fn from_items<'a>(
        items: impl IntoIterator<Item = &'a Item>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, PersistenceError> {
        let items = items
            .into_iter()
            .map(|item| {
                serde_json::to_value(item).map_err(|e| PersistenceError::Encode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { timestamp, items })
    }
}

/// Where snapshots live.
///
/// Implementations: JSON file, in-memory (for testing), none (no-op).
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// The backend name (e.g., "json", "memory", "none").
    fn name(&self) -> &str;

    /// Load the stored snapshot. `Ok(None)` means nothing has been saved yet.
    async fn load(&self) -> Result<Option<RawSnapshot>, PersistenceError>;

    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &RawSnapshot) -> Result<(), PersistenceError>;
}
