//! `ctxwarden init` — Write the default project configuration.

use ctxwarden_config::AppConfig;
use ctxwarden_core::Result;
use std::path::Path;

pub async fn run(root: &Path) -> Result<()> {
    let state_dir = AppConfig::state_dir(root);
    let config_path = AppConfig::config_path(root);

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&state_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created {}", config_path.display());

    Ok(())
}
