//! CLI command implementations.

pub mod entity;
pub mod import;
pub mod init;
pub mod list;
pub mod rebuild;
pub mod stats;

pub use entity::resolve_entities;
pub use import::import_file;
pub use init::init_store;
pub use list::{list, Listing};
pub use rebuild::rebuild_statistics;
pub use stats::show_statistics;

use anyhow::{Context, Result};
use semwiki_store::{Settings, SqlStore};
use std::path::Path;

/// Load settings (defaults when the file is missing) and open the store
pub fn open_store(config_path: &Path, db_path: &Path) -> Result<SqlStore> {
    let settings =
        Settings::load_or_default(Some(config_path)).context("Failed to load configuration")?;
    SqlStore::open(db_path, settings)
        .with_context(|| format!("Failed to open store at {:?}", db_path))
}
