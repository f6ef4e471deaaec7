//! Entity command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ResolvedEntity {
    id: i64,
    entity: Option<String>,
}

/// Resolve IDs through the entity cache; unknown IDs print as missing
pub fn resolve_entities(config_path: &Path, db_path: &Path, ids: &[i64], json: bool) -> Result<()> {
    let store = super::open_store(config_path, db_path)?;
    let cache = store.entity_id_cache();

    let mut resolved = Vec::with_capacity(ids.len());
    for &id in ids {
        let entity = cache
            .get_entity_for_id(id)
            .with_context(|| format!("Failed to resolve id {}", id))?;
        resolved.push(ResolvedEntity {
            id,
            entity: entity.map(|e| e.encode()),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        for item in &resolved {
            match &item.entity {
                Some(entity) => println!("{}\t{}", item.id, entity),
                None => println!("{}\t(unknown)", item.id),
            }
        }
    }
    Ok(())
}
