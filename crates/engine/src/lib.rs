//! The ctxwarden engine — a capacity-bounded working set of context items.
//!
//! A caller admits content; the engine fingerprints it, scores it for the
//! current task, and evicts the least useful items when the byte budget
//! would be exceeded. Snapshots are revalidated against live sources on load.
//!
//! # Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`TableScorer`] | Table-driven relevance in `[0, 1]` |
//! | [`GreedyEviction`] | Worst-first victim selection over (score, access time) |
//! | [`WorkingSet`] | Items, size accounting, capacity invariant |
//! | [`PersistenceBridge`] | Snapshot load/revalidate and save |
//! | [`SharedWorkingSet`] | Lock-guarded handle for concurrent callers |
//! | [`ContextManager`] | Everything above wired to a content reader |

pub mod eviction;
pub mod manager;
pub mod persistence;
pub mod report;
pub mod scorer;
pub mod shared;
pub mod working_set;

pub use eviction::{EvictionPolicy, GreedyEviction, Victims};
pub use manager::ContextManager;
pub use persistence::{LoadReport, PersistenceBridge, Revalidated};
pub use report::{ContextReport, RankedEntry};
pub use scorer::TableScorer;
pub use shared::SharedWorkingSet;
pub use working_set::{AdmissionOutcome, AdmissionStatus, CategoryStats, Summary, WorkingSet};

#[cfg(test)]
pub(crate) mod test_helpers;
