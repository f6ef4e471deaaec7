//! Init command implementation.

use anyhow::{Context, Result};
use semwiki_store::Settings;
use std::fs;
use std::path::Path;

/// Write a default configuration if missing and install the schema
pub fn init_store(config_path: &Path, db_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("{:?} already exists", config_path);
    } else {
        let yaml = serde_yaml::to_string(&Settings::default())
            .context("Failed to serialize default settings")?;
        fs::write(config_path, yaml)
            .with_context(|| format!("Failed to write {:?}", config_path))?;
        println!("Created {:?}", config_path);
    }

    super::open_store(config_path, db_path)?;
    println!("✓ Store ready at {:?}", db_path);
    Ok(())
}
