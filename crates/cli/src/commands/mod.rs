pub mod add;
pub mod init;
pub mod optimize;
pub mod relevant;
pub mod remove;
pub mod report;
pub mod status;

use chrono::Utc;
use ctxwarden_config::AppConfig;
use ctxwarden_core::{Result, SnapshotBackend};
use ctxwarden_engine::ContextManager;
use ctxwarden_store::{FsContentReader, JsonSnapshotStore};
use std::path::Path;
use std::sync::Arc;

/// Build a manager for the project at `root` and restore its last snapshot.
///
/// A snapshot that cannot be read is logged and the session starts empty;
/// it will be overwritten on the next save.
pub async fn open(root: &Path) -> Result<ContextManager> {
    let config = AppConfig::load(root)?;

    let reader = Arc::new(FsContentReader::new(root));
    let store: Arc<dyn SnapshotBackend> =
        Arc::new(JsonSnapshotStore::new(config.snapshot_path(root)));
    let manager = ContextManager::from_config(&config, reader, Some(store));

    match manager.load().await {
        Ok(report) if report.dropped() > 0 => tracing::info!(
            restored = report.restored,
            stale = report.stale,
            missing = report.missing,
            invalid = report.invalid,
            timed_out = report.timed_out,
            over_capacity = report.over_capacity,
            "Snapshot partially restored"
        ),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Snapshot unusable, starting empty"),
    }

    Ok(manager)
}

/// Persist the working set after a mutation.
pub async fn save(manager: &ContextManager) -> Result<()> {
    manager.checkpoint(Utc::now()).await?;
    Ok(())
}
