use std::path::Path;

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use super::model::{ResultSet, Value};
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// DataSource – the tabular store boundary
// ---------------------------------------------------------------------------

/// Anything that can run a SQL string with positionally bound parameters
/// (`?1`, `?2`, …) and hand back a rectangular result.
///
/// Values supplied by the user must travel through `params`; only fixed
/// identifiers may be spliced into `sql`.
pub trait DataSource {
    /// Human readable name shown in the top bar.
    fn describe(&self) -> String;

    fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, SourceError>;
}

// ---------------------------------------------------------------------------
// SQLite adapter
// ---------------------------------------------------------------------------

/// A SQLite connection. Closed when dropped.
pub struct SqliteSource {
    conn: Connection,
    label: String,
}

impl SqliteSource {
    /// Open an existing database file read-only.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SourceError::Connection(format!("{}: {e}", path.display())))?;
        Ok(Self {
            conn,
            label: path.display().to_string(),
        })
    }

    /// Empty in-memory database, filled by the importer.
    pub fn in_memory(label: impl Into<String>) -> Result<Self, SourceError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SourceError::Connection(e.to_string()))?;
        Ok(Self {
            conn,
            label: label.into(),
        })
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl DataSource for SqliteSource {
    fn describe(&self) -> String {
        format!("SQLite · {}", self.label)
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet, SourceError> {
        log::debug!("query: {sql} ({} bound)", params.len());
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(width);
            for idx in 0..width {
                record.push(Value::from(row.get_ref(idx)?));
            }
            out.push(record);
        }
        Ok(ResultSet::new(columns, out))
    }
}

// -- Value <-> SQLite conversions --

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Float(f),
            ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::Text(format!("<{} bytes>", bytes.len())),
        }
    }
}
