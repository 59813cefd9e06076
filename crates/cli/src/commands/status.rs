//! `ctxwarden status` — One-line usage summary.

use chrono::Utc;
use ctxwarden_config::AppConfig;
use ctxwarden_core::Result;
use std::path::Path;

pub async fn run(root: &Path) -> Result<()> {
    let manager = super::open(root).await?;
    let report = manager.report(Some(0), Utc::now()).await;
    let summary = &report.summary;

    println!("{}", report.one_line());
    if summary.approaching_limit {
        println!(
            "⚠️  {} of {} bytes used (warning at {})",
            summary.total_size, summary.capacity, summary.warning_threshold
        );
    }
    if !AppConfig::config_path(root).exists() {
        println!("   No config file — run `ctxwarden init` to customize limits");
    }

    Ok(())
}
