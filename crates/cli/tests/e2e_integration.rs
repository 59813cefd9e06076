//! End-to-end tests for ctxwarden.
//!
//! These exercise the real filesystem reader and JSON snapshot file together
//! with the engine: admission, eviction, reporting, and revalidation of a
//! saved snapshot after sources change on disk.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use ctxwarden_config::AppConfig;
use ctxwarden_core::{AdmissionError, SnapshotBackend};
use ctxwarden_engine::{AdmissionStatus, ContextManager};
use ctxwarden_store::{FsContentReader, JsonSnapshotStore};

// ── Helpers ──────────────────────────────────────────────────────────────

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn bytes(n: usize) -> String {
    "x".repeat(n)
}

fn config(capacity: usize, warning: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.context.max_context_size = capacity;
    config.context.warning_threshold = warning;
    config
}

/// A manager wired the way the binary wires it, with its snapshot restored.
async fn open(root: &Path, config: &AppConfig) -> ContextManager {
    let reader = Arc::new(FsContentReader::new(root));
    let store: Arc<dyn SnapshotBackend> =
        Arc::new(JsonSnapshotStore::new(config.snapshot_path(root)));
    let manager = ContextManager::from_config(config, reader, Some(store));
    manager.load().await.unwrap();
    manager
}

// ── Admission & Eviction ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_admit_from_disk_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "specs/api.md", &bytes(40));
    write(root, "src/lib.rs", &bytes(30));

    let manager = open(root, &config(1_000, 800)).await;
    let now = Utc::now();
    manager.add_source("specs/api.md", "specs", "", now).await.unwrap();
    manager.add_source("src/lib.rs", "code", "", now).await.unwrap();

    let report = manager.report(None, now).await;
    assert_eq!(report.summary.total_items, 2);
    assert_eq!(report.summary.total_size, 70);
    assert_eq!(report.top[0].identity, "specs/api.md");
    assert_eq!(report.one_line(), "Context: 2 items, 7.0% usage");

    let md = report.render_markdown();
    assert!(md.contains("# Context Usage Report"));
    assert!(md.contains("- Specs: 1 items, 40 bytes"));
    assert!(md.contains("1. specs/api.md"));
}

#[tokio::test]
async fn e2e_eviction_removes_least_relevant() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "specs/api.md", &bytes(40));
    write(root, "src/lib.rs", &bytes(30));
    write(root, "notes.md", &bytes(20));
    write(root, "product/roadmap.md", &bytes(30));

    let manager = open(root, &config(100, 80)).await;
    let now = Utc::now();
    manager.add_source("specs/api.md", "specs", "", now).await.unwrap();
    manager.add_source("src/lib.rs", "code", "", now).await.unwrap();
    manager.add_source("notes.md", "unknown", "", now).await.unwrap();

    let outcome = manager
        .add_source("product/roadmap.md", "product", "", now)
        .await
        .unwrap();
    assert_eq!(outcome.status, AdmissionStatus::Inserted);
    assert_eq!(outcome.evicted, vec!["notes.md"]);

    let summary = manager.working_set().summary().await;
    assert_eq!(summary.total_items, 3);
    assert_eq!(summary.total_size, 100);
    assert!(summary.approaching_limit);
}

#[tokio::test]
async fn e2e_oversized_file_rejected_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "small.md", &bytes(10));
    write(root, "huge.md", &bytes(150));

    let manager = open(root, &config(100, 80)).await;
    let now = Utc::now();
    manager.add_source("small.md", "specs", "", now).await.unwrap();

    let err = manager.add_source("huge.md", "specs", "", now).await.unwrap_err();
    assert!(matches!(err, AdmissionError::CapacityExceeded { size: 150, .. }));

    let summary = manager.working_set().summary().await;
    assert_eq!(summary.total_items, 1);
    assert_eq!(summary.total_size, 10);
}

#[tokio::test]
async fn e2e_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let manager = open(dir.path(), &config(100, 80)).await;

    let err = manager
        .add_source("nope.md", "specs", "", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn e2e_re_adding_edited_file_replaces_it() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "a.md", &bytes(10));

    let manager = open(root, &config(100, 80)).await;
    let now = Utc::now();
    manager.add_source("a.md", "specs", "", now).await.unwrap();
    let again = manager.add_source("a.md", "specs", "", now).await.unwrap();
    assert_eq!(again.status, AdmissionStatus::Unchanged);

    write(root, "a.md", &bytes(25));
    let edited = manager.add_source("a.md", "specs", "", now).await.unwrap();
    assert_eq!(edited.status, AdmissionStatus::Replaced { previous_size: 10 });
    assert_eq!(manager.working_set().summary().await.total_size, 25);
}

// ── Persistence ─────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "specs/api.md", "GET /items");
    write(root, "src/lib.rs", "pub mod api;");
    let config = config(1_000, 800);

    let first = open(root, &config).await;
    first.add_source("specs/api.md", "specs", "", Utc::now()).await.unwrap();
    first.add_source("src/lib.rs", "code", "", Utc::now()).await.unwrap();
    first.checkpoint(Utc::now()).await.unwrap();
    assert!(config.snapshot_path(root).exists());

    let second = open(root, &config).await;
    let summary = second.working_set().summary().await;
    assert_eq!(summary.total_items, 2);
    assert_eq!(summary.total_size, 22);
}

#[tokio::test]
async fn e2e_edited_and_deleted_sources_dropped_on_reload() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "keep.md", "stable");
    write(root, "edit.md", "before");
    write(root, "gone.md", "doomed");
    let config = config(1_000, 800);

    let first = open(root, &config).await;
    for id in ["keep.md", "edit.md", "gone.md"] {
        first.add_source(id, "specs", "", Utc::now()).await.unwrap();
    }
    first.checkpoint(Utc::now()).await.unwrap();

    write(root, "edit.md", "after!");
    std::fs::remove_file(root.join("gone.md")).unwrap();

    let reader = Arc::new(FsContentReader::new(root));
    let store: Arc<dyn SnapshotBackend> =
        Arc::new(JsonSnapshotStore::new(config.snapshot_path(root)));
    let second = ContextManager::from_config(&config, reader, Some(store));
    let report = second.load().await.unwrap();

    assert_eq!(report.restored, 1);
    assert_eq!(report.stale, 1);
    assert_eq!(report.missing, 1);
    let summary = second.working_set().summary().await;
    assert_eq!(summary.total_items, 1);
    assert_eq!(summary.total_size, 6);
}

#[tokio::test]
async fn e2e_corrupt_snapshot_file_surfaces_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config = config(1_000, 800);
    write(root, ".ctxwarden/cache/context_cache.json", "{ not json");

    let reader = Arc::new(FsContentReader::new(root));
    let store: Arc<dyn SnapshotBackend> =
        Arc::new(JsonSnapshotStore::new(config.snapshot_path(root)));
    let manager = ContextManager::from_config(&config, reader, Some(store));

    assert!(manager.load().await.is_err());
    assert_eq!(manager.working_set().summary().await.total_items, 0);
}

// ── Configuration ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_project_config_limits_apply() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        ".ctxwarden/config.toml",
        "[context]\nmax_context_size = 50\nwarning_threshold = 40\n",
    );
    write(root, "big.md", &bytes(60));

    let config = AppConfig::load_from(&AppConfig::config_path(root)).unwrap();
    assert_eq!(config.context.max_context_size, 50);

    let manager = open(root, &config).await;
    let err = manager
        .add_source("big.md", "specs", "", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "capacity_exceeded");
}
