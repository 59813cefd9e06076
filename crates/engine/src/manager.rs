//! Context manager — the working set wired to its collaborators.
//!
//! Owns a [`SharedWorkingSet`], the [`ContentReader`] used at admission, and
//! an optional [`PersistenceBridge`]. Sources are read before the working set
//! lock is taken, so a slow file never blocks other callers.

use chrono::{DateTime, Utc};
use ctxwarden_config::AppConfig;
use ctxwarden_core::{
    AdmissionError, ContentReader, Item, PersistenceError, ReadError, SnapshotBackend,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::persistence::{LoadReport, PersistenceBridge};
use crate::report::ContextReport;
use crate::scorer::TableScorer;
use crate::shared::SharedWorkingSet;
use crate::working_set::{AdmissionOutcome, WorkingSet};

pub struct ContextManager {
    set: SharedWorkingSet,
    reader: Arc<dyn ContentReader>,
    bridge: Option<PersistenceBridge>,
    read_timeout: Duration,
    relevance_floor: f32,
    report_top_n: usize,
}

impl ContextManager {
    /// Build an empty manager from configuration. Persistence is attached
    /// only when `backend` is given and `persistence.enabled` is set.
    pub fn from_config(
        config: &AppConfig,
        reader: Arc<dyn ContentReader>,
        backend: Option<Arc<dyn SnapshotBackend>>,
    ) -> Self {
        let set = WorkingSet::new(config.context.limits())
            .with_scorer(Arc::new(TableScorer::from_config(&config.scoring)));
        let bridge = backend
            .filter(|_| config.persistence.enabled)
            .map(|backend| {
                PersistenceBridge::from_config(backend, Arc::clone(&reader), &config.persistence)
            });

        Self {
            set: SharedWorkingSet::new(set),
            reader,
            bridge,
            read_timeout: Duration::from_millis(config.persistence.read_timeout_ms),
            relevance_floor: config.context.relevance_floor,
            report_top_n: config.context.report_top_n,
        }
    }

    pub fn working_set(&self) -> &SharedWorkingSet {
        &self.set
    }

    /// Restore the revalidated snapshot into the working set. Items admitted
    /// while the snapshot is being checked are kept. Without persistence
    /// this is a no-op.
    pub async fn load(&self) -> Result<LoadReport, PersistenceError> {
        match &self.bridge {
            Some(bridge) => bridge.load_shared(&self.set).await,
            None => Ok(LoadReport::default()),
        }
    }

    /// Save the working set. Without persistence this is a no-op.
    pub async fn checkpoint(&self, now: DateTime<Utc>) -> Result<(), PersistenceError> {
        match &self.bridge {
            Some(bridge) => bridge.save_shared(&self.set, now).await,
            None => Ok(()),
        }
    }

    /// Read `identity` through the content reader and admit it.
    ///
    /// A source the reader reports as larger than the whole capacity is
    /// rejected before its content is read.
    pub async fn add_source(
        &self,
        identity: &str,
        category: &str,
        task_hint: &str,
        now: DateTime<Utc>,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        if let Ok(Some(len)) =
            tokio::time::timeout(self.read_timeout, self.reader.size_hint(identity)).await
        {
            let (capacity, total_size) = {
                let set = self.set.read().await;
                (set.limits().capacity, set.total_size())
            };
            let size = usize::try_from(len).unwrap_or(usize::MAX);
            if size > capacity {
                warn!(identity, size, capacity, "Source alone exceeds capacity, not reading it");
                return Err(AdmissionError::CapacityExceeded {
                    identity: identity.to_string(),
                    size,
                    capacity,
                    reclaimable: total_size,
                });
            }
        }

        let live = match tokio::time::timeout(self.read_timeout, self.reader.read(identity)).await {
            Ok(read) => read,
            Err(_) => Err(ReadError::Unreadable {
                identity: identity.to_string(),
                reason: format!("timed out after {}ms", self.read_timeout.as_millis()),
            }),
        };
        let live = live.inspect_err(|e| warn!(identity, error = %e, "Cannot read source"))?;
        self.set.admit(identity, live, category, task_hint, now).await
    }

    pub async fn remove(&self, identity: &str) -> Option<Item> {
        self.set.remove(identity).await
    }

    /// Rescore for `task_hint` and prune below the configured floor when
    /// the set is over its warning threshold.
    pub async fn optimize(&self, task_hint: &str, now: DateTime<Utc>) -> Vec<String> {
        self.set.optimize(task_hint, now, self.relevance_floor).await
    }

    pub async fn relevant_for(&self, task_hint: &str, n: usize, now: DateTime<Utc>) -> Vec<Item> {
        self.set.relevant_for(task_hint, n, now).await
    }

    pub async fn report(&self, top_n: Option<usize>, now: DateTime<Utc>) -> ContextReport {
        self.set.report(top_n.unwrap_or(self.report_top_n), now).await
    }
}
