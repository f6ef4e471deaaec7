//! Store errors.

use semwiki_types::TypeError;
use thiserror::Error;

use crate::settings::SettingsError;

/// Failures of the backing store
///
/// Everything here is fatal for the current request. Data-quality issues
/// (invalid property titles, unknown IDs) never become a `StoreError`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Invalid data: {0}")]
    Type(#[from] TypeError),

    #[error("No property table for {0}")]
    UnknownPropertyTable(String),

    #[error("Unexpected value in column {column}: {reason}")]
    InvalidRow { column: String, reason: String },
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
