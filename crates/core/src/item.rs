//! Working-set items and capacity limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::fingerprint::fingerprint;

/// One admitted unit of content.
///
/// `content` is never patched: a change in the source produces a whole new
/// item with a new `fingerprint` and `size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable key (source path or logical id), unique within a working set.
    pub identity: String,

    /// The admitted payload.
    pub content: String,

    /// Byte length of `content`.
    pub size: usize,

    /// Caller-supplied label such as "standards", "specs", "code".
    pub category: String,

    /// Digest of `content` at admission time.
    pub fingerprint: String,

    /// Task-relative usefulness in `[0.0, 1.0]`.
    pub relevance_score: f32,

    /// Last time the item was read or rescored.
    pub last_accessed: DateTime<Utc>,

    /// Modification time of the source when it was read, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Item {
    /// Build an item, deriving `size` and `fingerprint` from `content`.
    pub fn new(
        identity: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        last_modified: Option<DateTime<Utc>>,
        relevance_score: f32,
        now: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            identity: identity.into(),
            size: content.len(),
            fingerprint: fingerprint(&content),
            content,
            category: category.into(),
            relevance_score,
            last_accessed: now,
            last_modified,
        }
    }

    /// The name used for keyword matching: the final path component of the
    /// identity, or the whole identity when it has none.
    pub fn display_name(&self) -> &str {
        display_name(&self.identity)
    }
}

/// Final path component of an identity.
pub fn display_name(identity: &str) -> &str {
    Path::new(identity)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(identity)
}

/// Byte budget for a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityLimits {
    /// Hard ceiling on the total size of admitted items.
    pub capacity: usize,
    /// Soft ceiling; above it the set is "approaching limit" and may be pruned.
    pub warning_threshold: usize,
}

impl CapacityLimits {
    pub fn new(capacity: usize, warning_threshold: usize) -> Self {
        Self {
            capacity,
            warning_threshold,
        }
    }
}
