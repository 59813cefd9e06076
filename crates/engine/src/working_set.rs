//! The working set — admitted items under a hard byte budget.
//!
//! Invariants, checked after every public mutation:
//!
//! - `total_size` equals the sum of item sizes
//! - `total_size <= capacity`
//!
//! Admission is all-or-nothing. Every check (oversize item, eviction
//! feasibility) runs before the first mutation, so a failed `admit` leaves
//! the set exactly as it was.

use chrono::{DateTime, Utc};
use ctxwarden_core::{
    AdmissionError, CapacityLimits, Item, RelevanceScorer, ScoreInput, SourceContent, fingerprint,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::eviction::{EvictionPolicy, GreedyEviction};
use crate::scorer::TableScorer;

// ── Types ─────────────────────────────────────────────────────────────────

/// What an admission did to the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdmissionStatus {
    /// A new identity was stored.
    Inserted,
    /// An existing identity got new content.
    Replaced { previous_size: usize },
    /// Same identity, same fingerprint: nothing changed.
    Unchanged,
}

/// Result of a successful `admit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionOutcome {
    pub status: AdmissionStatus,
    /// Items evicted to make room, in eviction order.
    pub evicted: Vec<String>,
    pub size: usize,
    pub relevance_score: f32,
}

/// Per-category aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub count: usize,
    pub size: usize,
}

/// Aggregate view of the set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_items: usize,
    pub total_size: usize,
    pub capacity: usize,
    pub warning_threshold: usize,
    /// `total_size / capacity * 100`
    pub usage_percentage: f64,
    /// `total_size > warning_threshold`
    pub approaching_limit: bool,
    pub categories: BTreeMap<String, CategoryStats>,
}

/// Best-first ordering: highest score, then most recent access, then identity.
pub fn relevance_order(a: &Item, b: &Item) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| b.last_accessed.cmp(&a.last_accessed))
        .then_with(|| a.identity.cmp(&b.identity))
}

/// Pin a scorer's output into `[0, 1]`; NaN counts as 0.
fn bounded(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

// ── WorkingSet ────────────────────────────────────────────────────────────

/// The in-memory table of admitted items.
pub struct WorkingSet {
    items: BTreeMap<String, Item>,
    total_size: usize,
    limits: CapacityLimits,
    scorer: Arc<dyn RelevanceScorer>,
    policy: Arc<dyn EvictionPolicy>,
}

impl std::fmt::Debug for WorkingSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingSet")
            .field("items", &self.items.len())
            .field("total_size", &self.total_size)
            .field("limits", &self.limits)
            .finish()
    }
}

impl WorkingSet {
    /// Create an empty set with the default scorer and greedy eviction.
    pub fn new(limits: CapacityLimits) -> Self {
        Self {
            items: BTreeMap::new(),
            total_size: 0,
            limits,
            scorer: Arc::new(TableScorer::default()),
            policy: Arc::new(GreedyEviction),
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn EvictionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    // ── Accessors ──

    pub fn limits(&self) -> CapacityLimits {
        self.limits
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.items.contains_key(identity)
    }

    /// Read an item without touching its access time.
    pub fn get(&self, identity: &str) -> Option<&Item> {
        self.items.get(identity)
    }

    /// Items in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    /// Read an item and record the access.
    pub fn access(&mut self, identity: &str, now: DateTime<Utc>) -> Option<&Item> {
        let item = self.items.get_mut(identity)?;
        item.last_accessed = now;
        Some(item)
    }

    // ── Mutations ──

    /// Admit `source` under `identity`, evicting lower-value items if needed.
    pub fn admit(
        &mut self,
        identity: &str,
        source: SourceContent,
        category: &str,
        task_hint: &str,
        now: DateTime<Utc>,
    ) -> Result<AdmissionOutcome, AdmissionError> {
        let size = source.content.len();
        let digest = fingerprint(&source.content);

        let previous_size = match self.items.get(identity) {
            Some(existing) if existing.fingerprint == digest => {
                debug!(identity, "Content unchanged, admission is a no-op");
                return Ok(AdmissionOutcome {
                    status: AdmissionStatus::Unchanged,
                    evicted: Vec::new(),
                    size: existing.size,
                    relevance_score: existing.relevance_score,
                });
            }
            Some(existing) => Some(existing.size),
            None => None,
        };

        let capacity = self.limits.capacity;
        if size > capacity {
            warn!(identity, size, capacity, "Item alone exceeds capacity");
            return Err(AdmissionError::CapacityExceeded {
                identity: identity.to_string(),
                size,
                capacity,
                reclaimable: self.total_size,
            });
        }

        // The entry being replaced is never a victim; its bytes are credited.
        let retained = self.total_size - previous_size.unwrap_or(0);
        let required = (retained + size).saturating_sub(capacity);

        let mut evicted = Vec::new();
        if required > 0 {
            let candidates: Vec<&Item> = self
                .items
                .values()
                .filter(|item| item.identity != identity)
                .collect();
            let victims = self.policy.select_victims(&candidates, required);
            if !victims.sufficient {
                warn!(
                    identity,
                    size,
                    required,
                    reclaimable = victims.freed,
                    "Eviction cannot free enough room"
                );
                return Err(AdmissionError::CapacityExceeded {
                    identity: identity.to_string(),
                    size,
                    capacity,
                    reclaimable: victims.freed + previous_size.unwrap_or(0),
                });
            }
            for victim in &victims.identities {
                if let Some(item) = self.take(victim) {
                    info!(
                        identity = %victim,
                        size = item.size,
                        relevance = item.relevance_score,
                        "Evicted to make room"
                    );
                }
            }
            evicted = victims.identities;
        }

        let relevance_score = bounded(self.scorer.score(&ScoreInput {
            identity,
            category,
            task_hint,
            last_modified: source.last_modified,
            now,
        }));
        let item = Item::new(
            identity,
            source.content,
            category,
            source.last_modified,
            relevance_score,
            now,
        );

        let status = match self.items.insert(identity.to_string(), item) {
            Some(old) => {
                self.total_size -= old.size;
                AdmissionStatus::Replaced {
                    previous_size: old.size,
                }
            }
            None => AdmissionStatus::Inserted,
        };
        self.total_size += size;

        info!(
            identity,
            size,
            relevance = relevance_score,
            evicted = evicted.len(),
            "Admitted into working set"
        );
        if self.total_size > self.limits.warning_threshold {
            warn!(
                total_size = self.total_size,
                capacity, "Working set approaching capacity"
            );
        }

        Ok(AdmissionOutcome {
            status,
            evicted,
            size,
            relevance_score,
        })
    }

    /// Remove an item. Absent identities are a no-op.
    pub fn remove(&mut self, identity: &str) -> Option<Item> {
        let item = self.take(identity)?;
        info!(identity, size = item.size, "Removed from working set");
        Some(item)
    }

    /// Recompute every score for `task_hint` and mark every item accessed.
    /// Never evicts.
    pub fn rescore_all(&mut self, task_hint: &str, now: DateTime<Utc>) {
        for item in self.items.values_mut() {
            item.relevance_score = bounded(self.scorer.score(&ScoreInput {
                identity: &item.identity,
                category: &item.category,
                task_hint,
                last_modified: item.last_modified,
                now,
            }));
            item.last_accessed = now;
        }
        debug!(items = self.items.len(), task = task_hint, "Rescored working set");
    }

    /// Remove every item scoring strictly below `threshold`.
    pub fn prune_below(&mut self, threshold: f32) -> Vec<String> {
        let doomed: Vec<String> = self
            .items
            .values()
            .filter(|item| item.relevance_score < threshold)
            .map(|item| item.identity.clone())
            .collect();
        for identity in &doomed {
            if let Some(item) = self.take(identity) {
                info!(
                    identity = %identity,
                    relevance = item.relevance_score,
                    "Removed low-relevance item"
                );
            }
        }
        doomed
    }

    /// Rescore for `task_hint`, then prune below `floor` only if the set is
    /// over its warning threshold.
    pub fn optimize(&mut self, task_hint: &str, now: DateTime<Utc>, floor: f32) -> Vec<String> {
        self.rescore_all(task_hint, now);
        if self.total_size > self.limits.warning_threshold {
            self.prune_below(floor)
        } else {
            Vec::new()
        }
    }

    /// Put back a previously persisted item if it fits.
    ///
    /// Returns `false` (and leaves the set untouched) when the identity is
    /// already present or the item would break the capacity ceiling.
    pub fn restore(&mut self, item: Item) -> bool {
        if self.items.contains_key(&item.identity)
            || self.total_size + item.size > self.limits.capacity
        {
            return false;
        }
        self.total_size += item.size;
        self.items.insert(item.identity.clone(), item);
        true
    }

    fn take(&mut self, identity: &str) -> Option<Item> {
        let item = self.items.remove(identity)?;
        self.total_size -= item.size;
        Some(item)
    }

    // ── Queries ──

    pub fn snapshot_summary(&self) -> Summary {
        let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();
        for item in self.items.values() {
            let stats = categories.entry(item.category.clone()).or_default();
            stats.count += 1;
            stats.size += item.size;
        }

        let usage_percentage = if self.limits.capacity == 0 {
            0.0
        } else {
            self.total_size as f64 / self.limits.capacity as f64 * 100.0
        };

        Summary {
            total_items: self.items.len(),
            total_size: self.total_size,
            capacity: self.limits.capacity,
            warning_threshold: self.limits.warning_threshold,
            usage_percentage,
            approaching_limit: self.total_size > self.limits.warning_threshold,
            categories,
        }
    }

    /// The `n` most relevant items, best first. Re-running the query on an
    /// unchanged set yields the same order.
    pub fn top_by_relevance(&self, n: usize) -> impl Iterator<Item = &Item> + '_ {
        let mut ranked: Vec<&Item> = self.items.values().collect();
        ranked.sort_unstable_by(|a, b| relevance_order(a, b));
        ranked.into_iter().take(n)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
