//! Content source and snapshot storage implementations for ctxwarden.

pub mod fs_reader;
pub mod in_memory;
pub mod json_file;

pub use fs_reader::FsContentReader;
pub use in_memory::InMemorySnapshotStore;
pub use json_file::JsonSnapshotStore;
