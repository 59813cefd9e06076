//! A working set shared across tasks.
//!
//! Mutations hold the write lock for their whole duration, so no caller can
//! observe a half-applied admit, remove, rescore or prune. Queries share the
//! read lock. Nothing here performs I/O while holding either lock.

use chrono::{DateTime, Utc};
use ctxwarden_core::{AdmissionError, Item, SourceContent};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::report::ContextReport;
use crate::working_set::{AdmissionOutcome, Summary, WorkingSet};

/// Cloneable handle to a single working set.
#[derive(Clone)]
pub struct SharedWorkingSet {
    inner: Arc<RwLock<WorkingSet>>,
}

impl SharedWorkingSet {
    pub fn new(set: WorkingSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(set)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, WorkingSet> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, WorkingSet> {
        self.inner.write().await
    }

    pub async fn admit(
        &self,
        identity: &str,
        source: SourceContent,
        category: &str,
        task_hint: &str,
        now: DateTime<Utc>,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        self.inner
            .write()
            .await
            .admit(identity, source, category, task_hint, now)
    }

    pub async fn remove(&self, identity: &str) -> Option<Item> {
        self.inner.write().await.remove(identity)
    }

    pub async fn rescore_all(&self, task_hint: &str, now: DateTime<Utc>) {
        self.inner.write().await.rescore_all(task_hint, now);
    }

    pub async fn prune_below(&self, threshold: f32) -> Vec<String> {
        self.inner.write().await.prune_below(threshold)
    }

    pub async fn optimize(&self, task_hint: &str, now: DateTime<Utc>, floor: f32) -> Vec<String> {
        self.inner.write().await.optimize(task_hint, now, floor)
    }

    pub async fn summary(&self) -> Summary {
        self.inner.read().await.snapshot_summary()
    }

    /// Rescore for `task_hint` and return the `n` best items, atomically.
    pub async fn relevant_for(&self, task_hint: &str, n: usize, now: DateTime<Utc>) -> Vec<Item> {
        let mut guard = self.inner.write().await;
        guard.rescore_all(task_hint, now);
        guard.top_by_relevance(n).cloned().collect()
    }

    pub async fn report(&self, top_n: usize, now: DateTime<Utc>) -> ContextReport {
        ContextReport::build(&*self.inner.read().await, top_n, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{at, source};
    use ctxwarden_core::CapacityLimits;

    #[tokio::test]
    async fn concurrent_admits_respect_capacity() {
        let shared = SharedWorkingSet::new(WorkingSet::new(CapacityLimits::new(100, 80)));

        let mut handles = Vec::new();
        for i in 0..20 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let identity = format!("docs/file-{i:02}.md");
                let _ = shared
                    .admit(&identity, source(&"x".repeat(15), None), "unknown", "", at(i))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let guard = shared.read().await;
        let sum: usize = guard.iter().map(|i| i.size).sum();
        assert_eq!(guard.total_size(), sum);
        assert!(guard.total_size() <= 100);
        assert_eq!(guard.len(), 6);
    }

    #[tokio::test]
    async fn relevant_for_rescores_then_ranks() {
        let shared = SharedWorkingSet::new(WorkingSet::new(CapacityLimits::new(1_000, 800)));
        shared
            .admit("ops/deploy.md", source("a", None), "unknown", "", at(0))
            .await
            .unwrap();
        shared
            .admit("ops/readme.md", source("b", None), "unknown", "", at(0))
            .await
            .unwrap();

        let top = shared.relevant_for("deploy", 1, at(5)).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].identity, "ops/deploy.md");
        assert_eq!(top[0].last_accessed, at(5));
    }
}
