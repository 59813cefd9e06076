//! `ctxwarden optimize` — Rescore for a task and prune when near the limit.

use chrono::Utc;
use ctxwarden_core::Result;
use std::path::Path;

pub async fn run(root: &Path, task: &str) -> Result<()> {
    let manager = super::open(root).await?;

    let pruned = manager.optimize(task, Utc::now()).await;
    super::save(&manager).await?;

    for identity in &pruned {
        println!("   pruned {identity}");
    }
    let report = manager.report(Some(0), Utc::now()).await;
    println!("✅ Optimized: {} removed. {}", pruned.len(), report.one_line());

    Ok(())
}
