//! The relational store boundary
//!
//! Callers describe queries as data: a table (or a literal join fragment),
//! a column list, [`Condition`]s and [`SelectOptions`]. Implementations
//! render them to SQL with bound parameters, so values never end up inside
//! query text.

mod sqlite;

pub use sqlite::SqliteDatabase;

use crate::error::{Result, StoreError};
use std::fmt;
use std::sync::Arc;

/// A bound value or a column value read back
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            SqlValue::Real(v) => Some(*v as i64),
            SqlValue::Text(v) => v.parse().ok(),
            SqlValue::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(v) => Some(*v as f64),
            SqlValue::Real(v) => Some(*v),
            SqlValue::Text(v) => v.parse().ok(),
            SqlValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

/// One result row, columns in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_i64(&self, column: &str) -> Result<i64> {
        self.require(column)?
            .as_i64()
            .ok_or_else(|| invalid(column, "expected an integer"))
    }

    /// Integer column where NULL reads as zero (aggregates over no rows)
    pub fn get_i64_or_zero(&self, column: &str) -> Result<i64> {
        match self.require(column)? {
            SqlValue::Null => Ok(0),
            value => value
                .as_i64()
                .ok_or_else(|| invalid(column, "expected an integer")),
        }
    }

    pub fn get_f64(&self, column: &str) -> Result<f64> {
        self.require(column)?
            .as_f64()
            .ok_or_else(|| invalid(column, "expected a number"))
    }

    pub fn get_str(&self, column: &str) -> Result<&str> {
        match self.require(column)? {
            SqlValue::Text(text) => Ok(text),
            SqlValue::Null => Ok(""),
            _ => Err(invalid(column, "expected text")),
        }
    }

    fn require(&self, column: &str) -> Result<&SqlValue> {
        self.get(column).ok_or_else(|| invalid(column, "missing column"))
    }
}

fn invalid(column: &str, reason: &str) -> StoreError {
    StoreError::InvalidRow {
        column: column.to_string(),
        reason: reason.to_string(),
    }
}

/// Most bound parameters SQLite accepts in one statement
///
/// Batch lookups with `IN` lists split their values into chunks of this size.
pub const MAX_BOUND_PARAMETERS: usize = 32766;

/// A single predicate; a condition list is a conjunction
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, SqlValue),
    NotEq(String, SqlValue),
    Gt(String, SqlValue),
    Lt(String, SqlValue),
    In(String, Vec<SqlValue>),
    /// `LIKE` with `\` as escape character
    Like(String, String),
    IsNull(String),
    /// Disjunction of the nested conditions
    Any(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: &str, value: impl Into<SqlValue>) -> Self {
        Condition::Eq(column.to_string(), value.into())
    }

    pub fn not_eq(column: &str, value: impl Into<SqlValue>) -> Self {
        Condition::NotEq(column.to_string(), value.into())
    }

    pub fn gt(column: &str, value: impl Into<SqlValue>) -> Self {
        Condition::Gt(column.to_string(), value.into())
    }

    pub fn lt(column: &str, value: impl Into<SqlValue>) -> Self {
        Condition::Lt(column.to_string(), value.into())
    }

    pub fn is_in<V: Into<SqlValue>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Condition::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn like(column: &str, pattern: impl Into<String>) -> Self {
        Condition::Like(column.to_string(), pattern.into())
    }

    pub fn is_null(column: &str) -> Self {
        Condition::IsNull(column.to_string())
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any(conditions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// `DISTINCT`, `GROUP BY`, `ORDER BY`, `LIMIT`, `OFFSET`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub distinct: bool,
    pub group_by: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push(OrderBy {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push(OrderBy {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// What a select reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    /// A logical table name; the table prefix is applied by the database
    Table(String),

    /// Literal `FROM` fragment, used for joins the condition model cannot
    /// express. Table names inside must already be prefixed via
    /// [`Database::table_name`].
    Join(String),
}

impl TableRef {
    pub fn table(name: &str) -> Self {
        TableRef::Table(name.to_string())
    }
}

/// Column update in an `UPDATE`
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Set(String, SqlValue),

    /// `column = column + delta`, evaluated by the database
    Increment(String, i64),
}

/// Read and write access to the backing store
pub trait Database: Send + Sync {
    fn select(
        &self,
        from: &TableRef,
        columns: &[&str],
        conditions: &[Condition],
        options: &SelectOptions,
    ) -> Result<Vec<Row>>;

    /// First matching row, if any
    fn select_row(
        &self,
        from: &TableRef,
        columns: &[&str],
        conditions: &[Condition],
    ) -> Result<Option<Row>> {
        let rows = self.select(from, columns, conditions, &SelectOptions::new().limit(1))?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row, returning its rowid
    fn insert(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<i64>;

    /// Returns the number of changed rows
    fn update(&self, table: &str, assignments: &[Assignment], conditions: &[Condition])
        -> Result<usize>;

    /// Returns the number of deleted rows
    fn delete(&self, table: &str, conditions: &[Condition]) -> Result<usize>;

    /// Run literal SQL (schema statements, transaction control)
    fn execute_batch(&self, sql: &str) -> Result<()>;

    /// Physical name of a logical table
    fn table_name(&self, name: &str) -> String;
}

impl fmt::Debug for dyn Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Database")
    }
}

/// Run `f` inside a transaction on `db`, rolling back when it fails
pub fn in_transaction<T>(db: &dyn Database, f: impl FnOnce() -> Result<T>) -> Result<T> {
    db.execute_batch("BEGIN")?;
    match f() {
        Ok(value) => {
            db.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = db.execute_batch("ROLLBACK") {
                tracing::warn!("Rollback failed: {}", rollback);
            }
            Err(err)
        }
    }
}

/// Replica and primary handles of one store
#[derive(Debug, Clone)]
pub struct Connections {
    replica: Arc<dyn Database>,
    primary: Arc<dyn Database>,
}

impl Connections {
    pub fn new(replica: Arc<dyn Database>, primary: Arc<dyn Database>) -> Self {
        Self { replica, primary }
    }

    /// One handle serving both roles
    pub fn single(db: Arc<dyn Database>) -> Self {
        Self {
            replica: db.clone(),
            primary: db,
        }
    }

    pub fn replica(&self) -> Arc<dyn Database> {
        self.replica.clone()
    }

    pub fn primary(&self) -> Arc<dyn Database> {
        self.primary.clone()
    }

    pub fn resolve(&self, connection: ConnectionRef) -> Arc<dyn Database> {
        match connection {
            ConnectionRef::Replica => self.replica(),
            ConnectionRef::Primary => self.primary(),
            ConnectionRef::Explicit(db) => db,
        }
    }
}

/// Which connection a collector reads through
#[derive(Debug, Clone, Default)]
pub enum ConnectionRef {
    #[default]
    Replica,

    /// Read-your-writes: use after a write that must be visible
    Primary,

    Explicit(Arc<dyn Database>),
}

impl From<bool> for ConnectionRef {
    /// `true` selects the primary connection
    fn from(primary: bool) -> Self {
        if primary {
            ConnectionRef::Primary
        } else {
            ConnectionRef::Replica
        }
    }
}

impl From<Arc<dyn Database>> for ConnectionRef {
    fn from(db: Arc<dyn Database>) -> Self {
        ConnectionRef::Explicit(db)
    }
}
