//! Content reader trait — where item content comes from.
//!
//! The working set never touches the filesystem itself. Admission and
//! snapshot revalidation both go through a `ContentReader`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ReadError;

/// Live content of a source together with its modification time.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceContent {
    pub content: String,
    /// `None` when the source cannot report one; scoring then skips the
    /// recency bonus.
    pub last_modified: Option<DateTime<Utc>>,
}

impl SourceContent {
    pub fn new(content: impl Into<String>, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            content: content.into(),
            last_modified,
        }
    }
}

/// Reads the current content behind an identity.
///
/// Implementations: filesystem, in-memory (for testing).
#[async_trait]
pub trait ContentReader: Send + Sync {
    /// The reader name (e.g., "fs", "memory").
    fn name(&self) -> &str;

    /// Read the live content for `identity`.
    async fn read(&self, identity: &str) -> Result<SourceContent, ReadError>;

    /// Byte size of the source, if it can be learned without reading the
    /// content. Lets admission reject an oversize source before loading it.
    async fn size_hint(&self, _identity: &str) -> Option<u64> {
        None
    }
}
