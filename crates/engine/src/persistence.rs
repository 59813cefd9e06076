//! Persistence bridge — snapshot load with revalidation, and save.
//!
//! Nothing in a snapshot is trusted on load:
//!
//! 1. Each record is decoded on its own; a record missing any field is dropped.
//! 2. A record whose stored size or fingerprint disagrees with its stored
//!    content is dropped as corrupt.
//! 3. The live source is re-read (bounded by a timeout) and the record is
//!    dropped if the source is gone, unreadable, slow, or hashes differently.
//! 4. Survivors are restored best-first into the live set under its write
//!    lock. Identities admitted meanwhile keep their live entry, and any
//!    survivor that no longer fits under the current capacity is skipped.
//!
//! One bad record never aborts the batch.

use chrono::{DateTime, Utc};
use ctxwarden_config::PersistenceConfig;
use ctxwarden_core::{
    ContentReader, Item, PersistenceError, RawSnapshot, ReadError, SnapshotBackend, fingerprint,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::shared::SharedWorkingSet;
use crate::working_set::{WorkingSet, relevance_order};

/// Counts of what happened to each snapshot record during a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub restored: usize,
    /// Missing fields, corrupt size/fingerprint, or duplicate identity.
    pub invalid: usize,
    /// Source content changed since the snapshot.
    pub stale: usize,
    /// Source no longer exists or cannot be read.
    pub missing: usize,
    pub timed_out: usize,
    /// Valid but would not fit under the current capacity.
    pub over_capacity: usize,
    /// Valid, but the live set already held a newer admission of it.
    pub superseded: usize,
}

impl LoadReport {
    pub fn dropped(&self) -> usize {
        self.invalid + self.stale + self.missing + self.timed_out + self.over_capacity
    }

    fn record(&mut self, err: &PersistenceError) {
        match err {
            PersistenceError::StaleSnapshot { .. } => self.stale += 1,
            PersistenceError::SourceMissing { .. } => self.missing += 1,
            PersistenceError::Timeout { .. } => self.timed_out += 1,
            _ => self.invalid += 1,
        }
    }
}

/// Snapshot records that passed revalidation, best first, waiting to be
/// applied to a working set.
#[derive(Debug, Default)]
pub struct Revalidated {
    survivors: Vec<Item>,
    report: LoadReport,
}

impl Revalidated {
    /// Restore the survivors into `set` and return the final report.
    ///
    /// Identities already present in `set` are left alone: an item admitted
    /// while the snapshot was being checked is newer than its cached copy.
    /// Survivors that would break the capacity ceiling are skipped.
    pub fn apply_to(self, set: &mut WorkingSet) -> LoadReport {
        let mut report = self.report;
        for item in self.survivors {
            let identity = item.identity.clone();
            if set.contains(&identity) {
                debug!(identity = %identity, "Live item supersedes cached copy");
                report.superseded += 1;
            } else if set.restore(item) {
                report.restored += 1;
            } else {
                warn!(identity = %identity, "Cached item no longer fits under capacity");
                report.over_capacity += 1;
            }
        }

        info!(
            restored = report.restored,
            dropped = report.dropped(),
            total_size = set.total_size(),
            "Snapshot applied"
        );
        report
    }
}

/// Connects a working set to a snapshot backend and a content reader.
pub struct PersistenceBridge {
    backend: Arc<dyn SnapshotBackend>,
    reader: Arc<dyn ContentReader>,
    read_timeout: Duration,
    concurrency: usize,
}

impl PersistenceBridge {
    pub fn from_config(
        backend: Arc<dyn SnapshotBackend>,
        reader: Arc<dyn ContentReader>,
        config: &PersistenceConfig,
    ) -> Self {
        Self {
            backend,
            reader,
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            concurrency: config.load_concurrency.max(1),
        }
    }

    /// Load the stored snapshot and check every record against its live
    /// source. Touches no working set, so no lock is needed while it runs.
    pub async fn revalidate(&self) -> Result<Revalidated, PersistenceError> {
        let mut report = LoadReport::default();
        let Some(snapshot) = self.backend.load().await? else {
            debug!(backend = self.backend.name(), "No snapshot stored yet");
            return Ok(Revalidated::default());
        };

        let mut seen = HashSet::new();
        let mut decoded = Vec::with_capacity(snapshot.items.len());
        for record in snapshot.items {
            match decode_record(record) {
                Ok(item) if seen.insert(item.identity.clone()) => decoded.push(item),
                Ok(item) => {
                    warn!(identity = %item.identity, "Duplicate snapshot entry, keeping the first");
                    report.invalid += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Discarding snapshot entry");
                    report.record(&e);
                }
            }
        }

        let checked: Vec<Result<Item, PersistenceError>> = stream::iter(decoded)
            .map(|item| self.revalidate_item(item))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut survivors = Vec::with_capacity(checked.len());
        for outcome in checked {
            match outcome {
                Ok(item) => survivors.push(item),
                Err(e) => {
                    match &e {
                        PersistenceError::StaleSnapshot { identity } => {
                            info!(identity = %identity, "Source changed, invalidating cached item")
                        }
                        other => warn!(error = %other, "Dropping cached item"),
                    }
                    report.record(&e);
                }
            }
        }
        survivors.sort_by(relevance_order);

        debug!(
            backend = self.backend.name(),
            snapshot_taken = %snapshot.timestamp,
            survivors = survivors.len(),
            "Snapshot revalidated"
        );
        Ok(Revalidated { survivors, report })
    }

    /// Revalidate without holding the lock, then restore the survivors into
    /// the live set under the write lock.
    pub async fn load_shared(
        &self,
        set: &SharedWorkingSet,
    ) -> Result<LoadReport, PersistenceError> {
        let revalidated = self.revalidate().await?;
        let mut guard = set.write().await;
        Ok(revalidated.apply_to(&mut guard))
    }

    /// Re-read the source behind `item` and keep it only if unchanged.
    async fn revalidate_item(&self, mut item: Item) -> Result<Item, PersistenceError> {
        let read = tokio::time::timeout(self.read_timeout, self.reader.read(&item.identity)).await;
        let live = match read {
            Err(_) => {
                return Err(PersistenceError::Timeout {
                    identity: item.identity,
                    timeout_ms: self.read_timeout.as_millis() as u64,
                });
            }
            Ok(Err(ReadError::NotFound(_))) => {
                return Err(PersistenceError::SourceMissing {
                    identity: item.identity,
                    reason: "not found".into(),
                });
            }
            Ok(Err(ReadError::Unreadable { reason, .. })) => {
                return Err(PersistenceError::SourceMissing {
                    identity: item.identity,
                    reason,
                });
            }
            Ok(Ok(live)) => live,
        };

        if fingerprint(&live.content) != item.fingerprint {
            return Err(PersistenceError::StaleSnapshot {
                identity: item.identity,
            });
        }
        item.last_modified = live.last_modified.or(item.last_modified);
        Ok(item)
    }

    /// Persist `set` as it is at `now`.
    pub async fn save(&self, set: &WorkingSet, now: DateTime<Utc>) -> Result<(), PersistenceError> {
        let snapshot = RawSnapshot::from_items(set.iter(), now)?;
        self.write(snapshot).await
    }

    /// Persist a shared set. The read lock is released before any I/O.
    pub async fn save_shared(
        &self,
        set: &SharedWorkingSet,
        now: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let snapshot = {
            let guard = set.read().await;
            RawSnapshot::from_items(guard.iter(), now)?
        };
        self.write(snapshot).await
    }

    async fn write(&self, snapshot: RawSnapshot) -> Result<(), PersistenceError> {
        let count = snapshot.items.len();
        self.backend.save(&snapshot).await?;
        debug!(backend = self.backend.name(), items = count, "Snapshot saved");
        Ok(())
    }
}

/// Decode one snapshot record and check it is internally consistent.
fn decode_record(record: serde_json::Value) -> Result<Item, PersistenceError> {
    let item: Item = serde_json::from_value(record)
        .map_err(|e| PersistenceError::InvalidEntry(e.to_string()))?;

    if item.size != item.content.len() {
        return Err(PersistenceError::InvalidEntry(format!(
            "{}: recorded size {} but content is {} bytes",
            item.identity,
            item.size,
            item.content.len()
        )));
    }
    if fingerprint(&item.content) != item.fingerprint {
        return Err(PersistenceError::InvalidEntry(format!(
            "{}: fingerprint does not match stored content",
            item.identity
        )));
    }
    if !(0.0..=1.0).contains(&item.relevance_score) {
        return Err(PersistenceError::InvalidEntry(format!(
            "{}: relevance score {} out of range",
            item.identity, item.relevance_score
        )));
    }
    Ok(item)
}
