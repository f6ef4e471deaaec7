#![allow(dead_code)]

use parking_lot::Mutex;
use semwiki_store::database::{Assignment, Row, SelectOptions, SqlValue, TableRef};
use semwiki_store::{Condition, Database, Result, Settings, SqlStore, SqliteDatabase};
use semwiki_types::{DataItem, EntityDescriptor, Property, SemanticData, NS_MAIN};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegates to a real database and records every read
pub struct RecordingDatabase {
    inner: Arc<dyn Database>,
    selects: AtomicUsize,
    tables: Mutex<Vec<TableRef>>,
}

impl RecordingDatabase {
    pub fn new(inner: Arc<dyn Database>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            selects: AtomicUsize::new(0),
            tables: Mutex::new(Vec::new()),
        })
    }

    /// Number of `select` and `select_row` calls so far
    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    pub fn tables(&self) -> Vec<TableRef> {
        self.tables.lock().clone()
    }

    pub fn joins(&self) -> usize {
        self.tables()
            .iter()
            .filter(|table| matches!(table, TableRef::Join(_)))
            .count()
    }

    pub fn reset(&self) {
        self.selects.store(0, Ordering::SeqCst);
        self.tables.lock().clear();
    }

    fn record(&self, from: &TableRef) {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.tables.lock().push(from.clone());
    }
}

impl Database for RecordingDatabase {
    fn select(
        &self,
        from: &TableRef,
        columns: &[&str],
        conditions: &[Condition],
        options: &SelectOptions,
    ) -> Result<Vec<Row>> {
        self.record(from);
        self.inner.select(from, columns, conditions, options)
    }

    fn select_row(
        &self,
        from: &TableRef,
        columns: &[&str],
        conditions: &[Condition],
    ) -> Result<Option<Row>> {
        self.record(from);
        self.inner.select_row(from, columns, conditions)
    }

    fn insert(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<i64> {
        self.inner.insert(table, values)
    }

    fn update(
        &self,
        table: &str,
        assignments: &[Assignment],
        conditions: &[Condition],
    ) -> Result<usize> {
        self.inner.update(table, assignments, conditions)
    }

    fn delete(&self, table: &str, conditions: &[Condition]) -> Result<usize> {
        self.inner.delete(table, conditions)
    }

    fn execute_batch(&self, sql: &str) -> Result<()> {
        self.inner.execute_batch(sql)
    }

    fn table_name(&self, name: &str) -> String {
        self.inner.table_name(name)
    }
}

/// In-memory SQLite database with the schema installed
pub fn sqlite() -> Arc<dyn Database> {
    let db: Arc<dyn Database> = Arc::new(SqliteDatabase::open_in_memory().unwrap());
    semwiki_store::schema::install(db.as_ref(), &Default::default()).unwrap();
    db
}

/// Store over a recording wrapper of a fresh database
pub fn recorded_store(settings: Settings) -> (SqlStore, Arc<RecordingDatabase>) {
    let recorder = RecordingDatabase::new(sqlite());
    let store = SqlStore::builder(recorder.clone()).settings(settings).build();
    (store, recorder)
}

pub fn store() -> SqlStore {
    SqlStore::open_in_memory(Settings::default()).unwrap()
}

pub fn property(key: &str) -> Property {
    Property::new(key).unwrap()
}

pub fn page(title: &str) -> EntityDescriptor {
    EntityDescriptor::page(title, NS_MAIN)
}

/// Store a page with the given page-valued statements
pub fn annotate(store: &SqlStore, title: &str, statements: &[(&str, &str)]) {
    let mut data = SemanticData::new(page(title));
    for (key, target) in statements {
        data.add(property(key), DataItem::WikiPage(page(target)));
    }
    store.update_data(&data).unwrap();
}

/// Create the declaration page of a property
pub fn declare(store: &SqlStore, key: &str, type_id: &str) {
    let data = SemanticData::new(property(key).declaration_page())
        .with(property("_TYPE"), DataItem::Uri(type_id.to_string()));
    store.update_data(&data).unwrap();
}
