//! SQLite implementation of the store boundary.

use super::{Assignment, Condition, Database, Row, SelectOptions, SqlValue, TableRef};
use crate::error::Result;
use parking_lot::Mutex;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::fmt;
use std::path::Path;
use std::time::Duration;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(v) => SqlValue::Integer(v),
            ValueRef::Real(v) => SqlValue::Real(v),
            ValueRef::Text(v) | ValueRef::Blob(v) => {
                SqlValue::Text(String::from_utf8_lossy(v).into_owned())
            }
        }
    }
}

/// A store backed by one SQLite connection
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
    table_prefix: String,
}

impl SqliteDatabase {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            table_prefix: String::new(),
        }
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    fn from_clause(&self, from: &TableRef) -> String {
        match from {
            TableRef::Table(name) => self.table_name(name),
            TableRef::Join(fragment) => fragment.clone(),
        }
    }
}

impl fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("table_prefix", &self.table_prefix)
            .finish()
    }
}

/// Render a conjunction, appending bound values to `params`
fn where_clause(conditions: &[Condition], params: &mut Vec<SqlValue>) -> String {
    if conditions.is_empty() {
        return String::new();
    }

    let rendered: Vec<String> = conditions
        .iter()
        .map(|condition| render_condition(condition, params))
        .collect();

    format!(" WHERE {}", rendered.join(" AND "))
}

fn render_condition(condition: &Condition, params: &mut Vec<SqlValue>) -> String {
    match condition {
        Condition::Eq(column, value) => {
            params.push(value.clone());
            format!("{} = ?", column)
        }
        Condition::NotEq(column, value) => {
            params.push(value.clone());
            format!("{} != ?", column)
        }
        Condition::Gt(column, value) => {
            params.push(value.clone());
            format!("{} > ?", column)
        }
        Condition::Lt(column, value) => {
            params.push(value.clone());
            format!("{} < ?", column)
        }
        Condition::In(_, values) if values.is_empty() => "0 = 1".to_string(),
        Condition::In(column, values) => {
            params.extend(values.iter().cloned());
            let placeholders = vec!["?"; values.len()].join(", ");
            format!("{} IN ({})", column, placeholders)
        }
        Condition::Like(column, pattern) => {
            params.push(SqlValue::Text(pattern.clone()));
            format!("{} LIKE ? ESCAPE '\\'", column)
        }
        Condition::IsNull(column) => format!("{} IS NULL", column),
        Condition::Any(conditions) if conditions.is_empty() => "0 = 1".to_string(),
        Condition::Any(conditions) => {
            let rendered: Vec<String> = conditions
                .iter()
                .map(|condition| render_condition(condition, params))
                .collect();
            format!("({})", rendered.join(" OR "))
        }
    }
}

fn options_clause(options: &SelectOptions) -> String {
    let mut sql = String::new();

    if !options.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&options.group_by.join(", "));
    }

    if !options.order_by.is_empty() {
        let order: Vec<String> = options
            .order_by
            .iter()
            .map(|o| {
                if o.descending {
                    format!("{} DESC", o.column)
                } else {
                    format!("{} ASC", o.column)
                }
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }

    match (options.limit, options.offset) {
        (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
        (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
        // SQLite has no OFFSET without LIMIT
        (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
        (None, None) => {}
    }

    sql
}

pub(crate) fn select_sql(
    from: &str,
    columns: &[&str],
    conditions: &[Condition],
    options: &SelectOptions,
    params: &mut Vec<SqlValue>,
) -> String {
    let columns = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    let distinct = if options.distinct { "DISTINCT " } else { "" };

    format!(
        "SELECT {}{} FROM {}{}{}",
        distinct,
        columns,
        from,
        where_clause(conditions, params),
        options_clause(options)
    )
}

impl Database for SqliteDatabase {
    fn select(
        &self,
        from: &TableRef,
        columns: &[&str],
        conditions: &[Condition],
        options: &SelectOptions,
    ) -> Result<Vec<Row>> {
        let mut params = Vec::new();
        let sql = select_sql(&self.from_clause(from), columns, conditions, options, &mut params);
        tracing::trace!("{}", sql);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let mut columns = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                columns.push((name.clone(), SqlValue::from(row.get_ref(index)?)));
            }
            Ok(Row::new(columns))
        })?;

        let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn insert(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<i64> {
        let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name(table),
            columns.join(", "),
            placeholders
        );
        tracing::trace!("{}", sql);

        let conn = self.conn.lock();
        conn.execute(&sql, params_from_iter(values.iter().map(|(_, value)| value)))?;
        Ok(conn.last_insert_rowid())
    }

    fn update(
        &self,
        table: &str,
        assignments: &[Assignment],
        conditions: &[Condition],
    ) -> Result<usize> {
        let mut params = Vec::new();
        let set: Vec<String> = assignments
            .iter()
            .map(|assignment| match assignment {
                Assignment::Set(column, value) => {
                    params.push(value.clone());
                    format!("{} = ?", column)
                }
                Assignment::Increment(column, delta) => {
                    params.push(SqlValue::Integer(*delta));
                    format!("{} = {} + ?", column, column)
                }
            })
            .collect();

        let sql = format!(
            "UPDATE {} SET {}{}",
            self.table_name(table),
            set.join(", "),
            where_clause(conditions, &mut params)
        );
        tracing::trace!("{}", sql);

        let conn = self.conn.lock();
        Ok(conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    fn delete(&self, table: &str, conditions: &[Condition]) -> Result<usize> {
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            self.table_name(table),
            where_clause(conditions, &mut params)
        );
        tracing::trace!("{}", sql);

        let conn = self.conn.lock();
        Ok(conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    fn table_name(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }
}
