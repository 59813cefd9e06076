//! Victim selection when the working set must shrink.
//!
//! The default policy is a greedy scan over candidates ordered worst-first:
//! lowest relevance, then oldest access, then identity. It takes the shortest
//! prefix of that order that frees the required bytes. It never searches for
//! a smaller total, so the same state always evicts the same items.

use ctxwarden_core::Item;
use std::cmp::Ordering;

/// Outcome of a victim selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Victims {
    /// Identities to evict, in eviction order.
    pub identities: Vec<String>,
    /// Total bytes the victims occupy.
    pub freed: usize,
    /// `false` when even evicting every candidate frees too little.
    pub sufficient: bool,
}

/// Chooses which items to evict to free `required` bytes.
pub trait EvictionPolicy: Send + Sync {
    fn select_victims(&self, candidates: &[&Item], required: usize) -> Victims;
}

/// Worst-first ordering used for eviction.
pub fn eviction_order(a: &Item, b: &Item) -> Ordering {
    a.relevance_score
        .total_cmp(&b.relevance_score)
        .then_with(|| a.last_accessed.cmp(&b.last_accessed))
        .then_with(|| a.identity.cmp(&b.identity))
}

/// Greedy prefix over [`eviction_order`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyEviction;

impl EvictionPolicy for GreedyEviction {
    fn select_victims(&self, candidates: &[&Item], required: usize) -> Victims {
        let mut ordered = candidates.to_vec();
        ordered.sort_by(|a, b| eviction_order(a, b));

        let mut identities = Vec::new();
        let mut freed = 0usize;
        for item in ordered {
            if freed >= required {
                break;
            }
            identities.push(item.identity.clone());
            freed += item.size;
        }

        Victims {
            identities,
            freed,
            sufficient: freed >= required,
        }
    }
}
