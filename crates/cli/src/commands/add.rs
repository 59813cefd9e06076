//! `ctxwarden add` — Admit a file into the working set.

use chrono::Utc;
use ctxwarden_core::Result;
use ctxwarden_engine::AdmissionStatus;
use std::path::Path;

pub async fn run(root: &Path, path: &str, category: &str, task: &str) -> Result<()> {
    let manager = super::open(root).await?;

    let outcome = manager.add_source(path, category, task, Utc::now()).await?;

    match outcome.status {
        AdmissionStatus::Unchanged => {
            println!("  {path} already in context (unchanged)");
        }
        AdmissionStatus::Inserted => {
            super::save(&manager).await?;
            println!(
                "✅ Added {path} ({} bytes, relevance {:.2})",
                outcome.size, outcome.relevance_score
            );
        }
        AdmissionStatus::Replaced { previous_size } => {
            super::save(&manager).await?;
            println!(
                "✅ Updated {path} ({previous_size} → {} bytes, relevance {:.2})",
                outcome.size, outcome.relevance_score
            );
        }
    }
    for evicted in &outcome.evicted {
        println!("   evicted {evicted}");
    }

    let summary = manager.working_set().summary().await;
    if summary.approaching_limit {
        println!(
            "⚠️  Context at {:.1}% of capacity — consider `ctxwarden optimize`",
            summary.usage_percentage
        );
    }

    Ok(())
}
