//! Import command implementation.

use anyhow::{Context, Result};
use semwiki_types::SemanticData;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Many(Vec<SemanticData>),
    One(Box<SemanticData>),
}

/// Store every subject in `file`, replacing what was stored before
pub fn import_file(config_path: &Path, db_path: &Path, file: &Path) -> Result<()> {
    let contents =
        fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let subjects = match serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {:?}", file))?
    {
        ImportFile::Many(subjects) => subjects,
        ImportFile::One(subject) => vec![*subject],
    };

    let store = super::open_store(config_path, db_path)?;
    let mut statements = 0;
    for data in &subjects {
        store
            .update_data(data)
            .with_context(|| format!("Failed to store {}", data.subject))?;
        statements += data.statements.len()
            + data
                .subobjects
                .iter()
                .map(|sub| sub.statements.len())
                .sum::<usize>();
    }

    println!(
        "Imported {} subjects ({} statements)",
        subjects.len(),
        statements
    );
    Ok(())
}
