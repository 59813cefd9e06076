//! `ctxwarden report` — Context usage report.

use chrono::Utc;
use ctxwarden_core::Result;
use std::path::Path;

pub async fn run(root: &Path, top: Option<usize>, json: bool) -> Result<()> {
    let manager = super::open(root).await?;
    let report = manager.report(top, Utc::now()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_markdown());
    }

    Ok(())
}
