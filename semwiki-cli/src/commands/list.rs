//! Property listing commands.

use crate::ListArgs;
use anyhow::{Context, Result};
use semwiki_store::ObjectCollector;
use semwiki_types::{PropertyOrError, PropertyUsage, RequestOptions, StringConditionKind};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Properties,
    Wanted,
    Unused,
}

pub fn list(config_path: &Path, db_path: &Path, listing: Listing, args: &ListArgs) -> Result<()> {
    let store = super::open_store(config_path, db_path)?;
    let options = request_options(args);

    let results: Vec<PropertyUsage> = match listing {
        Listing::Properties => {
            let mut collector = store.properties_collector(false);
            collector.set_request_options(options);
            collector.get_results()
        }
        Listing::Wanted => {
            let mut collector = store.wanted_properties_collector(false);
            collector.set_request_options(options);
            collector.get_results()
        }
        Listing::Unused => {
            let mut collector = store.unused_properties_collector(false);
            collector.set_request_options(options);
            collector
                .get_results()
                .map(|properties| properties.into_iter().map(|p| PropertyUsage::new(p, 0)).collect())
        }
    }
    .with_context(|| format!("Failed to list {:?}", listing))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for usage in &results {
        match (&usage.property, listing) {
            (PropertyOrError::Error(error), _) => {
                println!("{}\t(invalid: {})", error.title, error.message.key)
            }
            (property, Listing::Unused) => println!("{}", property),
            (property, _) => println!("{}\t{}", property, usage.usage_count),
        }
    }
    Ok(())
}

fn request_options(args: &ListArgs) -> RequestOptions {
    let mut options = RequestOptions::new()
        .with_limit(args.limit)
        .with_offset(args.offset);
    if let Some(prefix) = &args.prefix {
        options = options.with_string_condition(prefix.as_str(), StringConditionKind::Prefix);
    }
    if let Some(text) = &args.contains {
        options = options.with_string_condition(text.as_str(), StringConditionKind::Contains);
    }
    options
}
