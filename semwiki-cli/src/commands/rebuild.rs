//! Rebuild-stats command implementation.

use anyhow::{Context, Result};
use std::path::Path;

pub fn rebuild_statistics(config_path: &Path, db_path: &Path, json: bool) -> Result<()> {
    let store = super::open_store(config_path, db_path)?;
    let report = store
        .rebuild_property_statistics()
        .context("Failed to rebuild property statistics")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "✓ Rebuilt usage counts: {} properties, {} uses",
            report.properties, report.uses
        );
    }
    Ok(())
}
