//! # ctxwarden Core
//!
//! Domain types, traits, and error definitions for the ctxwarden context
//! working set. This crate performs **no I/O** — it defines the
//! domain model that the engine, the store adapters and the CLI build on.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the working set is a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping the content source (filesystem, in-memory, remote)
//! - Swapping the scoring rules without touching capacity invariants
//! - Easy testing with stub readers and snapshot backends

pub mod error;
pub mod fingerprint;
pub mod item;
pub mod reader;
pub mod scoring;
pub mod snapshot;

// Re-export key types at crate root for ergonomics
pub use error::{AdmissionError, Error, PersistenceError, ReadError, Result};
pub use fingerprint::fingerprint;
pub use item::{CapacityLimits, Item, display_name};
pub use reader::{ContentReader, SourceContent};
pub use scoring::{RelevanceScorer, ScoreInput};
pub use snapshot::{RawSnapshot, SnapshotBackend};
