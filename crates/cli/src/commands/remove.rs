//! `ctxwarden remove` — Drop a file from the working set.

use ctxwarden_core::Result;
use std::path::Path;

pub async fn run(root: &Path, path: &str) -> Result<()> {
    let manager = super::open(root).await?;

    match manager.remove(path).await {
        Some(item) => {
            super::save(&manager).await?;
            println!("🗑️  Removed {} ({} bytes)", item.identity, item.size);
        }
        None => println!("  {path} is not in context"),
    }

    Ok(())
}
