//! Error types for the ctxwarden domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all ctxwarden operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Admission errors ---
    #[error("Admission error: {0}")]
    Admission(#[from] AdmissionError),

    // --- Persistence errors ---
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Local filesystem (project state directory) ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Why an item could not be admitted into the working set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    #[error("Source not found: {identity}")]
    NotFound { identity: String },

    #[error("Source unreadable: {identity} — {reason}")]
    Unreadable { identity: String, reason: String },

    #[error(
        "No room for {identity}: needs {size} bytes, capacity {capacity}, \
         at most {reclaimable} bytes could be freed"
    )]
    CapacityExceeded {
        identity: String,
        size: usize,
        capacity: usize,
        reclaimable: usize,
    },
}

impl AdmissionError {
    /// Stable short label for the failure kind (used in CLI output and logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Unreadable { .. } => "unreadable",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
        }
    }
}

/// Errors raised by a content reader.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to read {identity}: {reason}")]
    Unreadable { identity: String, reason: String },
}

impl From<ReadError> for AdmissionError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::NotFound(identity) => Self::NotFound { identity },
            ReadError::Unreadable { identity, reason } => Self::Unreadable { identity, reason },
        }
    }
}

/// Errors from loading, revalidating or saving a snapshot.
///
/// Only `Io` and `Encode` are surfaced by `save`/`load`; the per-item
/// variants classify entries dropped during revalidation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    #[error("Snapshot I/O failed at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to encode snapshot: {0}")]
    Encode(String),

    #[error("Snapshot entry {identity} no longer matches its source")]
    StaleSnapshot { identity: String },

    #[error("Snapshot entry {identity} source is gone: {reason}")]
    SourceMissing { identity: String, reason: String },

    #[error("Timed out re-reading {identity} after {timeout_ms}ms")]
    Timeout { identity: String, timeout_ms: u64 },

    #[error("Invalid snapshot entry: {0}")]
    InvalidEntry(String),
}
