//! Statistics command implementation.

use anyhow::{Context, Result};
use semwiki_store::ObjectCollector;
use std::path::Path;

pub fn show_statistics(config_path: &Path, db_path: &Path, json: bool) -> Result<()> {
    let store = super::open_store(config_path, db_path)?;
    let snapshot = store
        .statistics_collector(false)
        .get_results()
        .context("Failed to compute statistics")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", snapshot);
    }
    Ok(())
}
