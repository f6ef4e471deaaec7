//! Table layout and installation.

use crate::database::{Condition, Database, SqlValue, TableRef};
use crate::error::Result;
use crate::property_tables::PropertyTables;
use semwiki_types::{PREDEFINED_ID_BOUNDARY, PREDEFINED_PROPERTIES, NS_PROPERTY};

/// Entity ID table
pub const ID_TABLE: &str = "smw_object_ids";

/// Per-property usage counts
pub const STATS_TABLE: &str = "smw_prop_stats";

/// Host wiki page table
pub const PAGE_TABLE: &str = "page";

/// Interwiki marker of the row that ends the reserved ID range
pub const BORDER_IW: &str = ":smw-border";

/// Create every table and seed the reserved IDs; safe to run repeatedly
pub fn install(db: &dyn Database, tables: &PropertyTables) -> Result<()> {
    let ids = db.table_name(ID_TABLE);
    let stats = db.table_name(STATS_TABLE);
    let page = db.table_name(PAGE_TABLE);

    db.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {ids} (
            smw_id INTEGER PRIMARY KEY,
            smw_namespace INTEGER NOT NULL,
            smw_title TEXT NOT NULL,
            smw_iw TEXT NOT NULL DEFAULT '',
            smw_subobject TEXT NOT NULL DEFAULT '',
            smw_sortkey TEXT NOT NULL DEFAULT ''
        );
        CREATE UNIQUE INDEX IF NOT EXISTS {ids}_entity
            ON {ids} (smw_title, smw_namespace, smw_iw, smw_subobject);
        CREATE INDEX IF NOT EXISTS {ids}_sortkey ON {ids} (smw_sortkey);
        CREATE TABLE IF NOT EXISTS {stats} (
            p_id INTEGER PRIMARY KEY,
            usage_count INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS {page} (
            page_id INTEGER PRIMARY KEY,
            page_namespace INTEGER NOT NULL,
            page_title TEXT NOT NULL,
            UNIQUE (page_namespace, page_title)
        );"
    ))?;

    for table in tables.iter() {
        db.execute_batch(&table.create_sql(&db.table_name(table.name())))?;
    }

    seed_reserved_ids(db)?;

    tracing::info!("Installed {} property tables", tables.iter().count());
    Ok(())
}

fn seed_reserved_ids(db: &dyn Database) -> Result<()> {
    for property in PREDEFINED_PROPERTIES {
        insert_reserved(
            db,
            property.id,
            vec![
                ("smw_namespace", NS_PROPERTY.into()),
                ("smw_title", property.key.into()),
                ("smw_iw", "".into()),
                ("smw_subobject", "".into()),
                ("smw_sortkey", property.label.into()),
            ],
        )?;
    }

    // User entities are numbered after this row
    insert_reserved(
        db,
        PREDEFINED_ID_BOUNDARY,
        vec![
            ("smw_namespace", 0.into()),
            ("smw_title", "".into()),
            ("smw_iw", BORDER_IW.into()),
            ("smw_subobject", "".into()),
            ("smw_sortkey", "".into()),
        ],
    )
}

fn insert_reserved(db: &dyn Database, id: i64, mut values: Vec<(&str, SqlValue)>) -> Result<()> {
    let existing = db.select_row(
        &TableRef::table(ID_TABLE),
        &["smw_id"],
        &[Condition::eq("smw_id", id)],
    )?;

    if existing.is_none() {
        values.insert(0, ("smw_id", id.into()));
        db.insert(ID_TABLE, &values)?;
    }
    Ok(())
}
