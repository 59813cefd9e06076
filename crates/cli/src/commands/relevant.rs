//! `ctxwarden relevant` — List the items most relevant to a task.

use chrono::Utc;
use ctxwarden_core::Result;
use std::path::Path;

pub async fn run(root: &Path, task: &str, limit: usize) -> Result<()> {
    let manager = super::open(root).await?;

    let items = manager.relevant_for(task, limit, Utc::now()).await;
    super::save(&manager).await?;

    if items.is_empty() {
        println!("   Context is empty. Add files with `ctxwarden add <path>`.");
        return Ok(());
    }

    println!("🔍 Most relevant for: \"{task}\"");
    for (i, item) in items.iter().enumerate() {
        println!(
            "  {:>2}. [{:.2}] {} ({}, {} bytes)",
            i + 1,
            item.relevance_score,
            item.identity,
            item.category,
            item.size
        );
    }

    Ok(())
}
