use std::fmt;

use super::model::{ResultSet, Value};
use super::queries::{self, TableName};
use super::schema::resolve_column;
use super::source::DataSource;
use crate::error::SectionError;

// ---------------------------------------------------------------------------
// Drill-down dimensions
// ---------------------------------------------------------------------------

/// A column the record table can be narrowed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Major,
    GraduatedYear,
    Country,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Major, Dimension::GraduatedYear, Dimension::Country];

    /// Fixed column name. Never derived from user input.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Major => queries::MAJOR,
            Dimension::GraduatedYear => queries::GRADUATED_YEAR,
            Dimension::Country => queries::COUNTRY,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Major => "Major",
            Dimension::GraduatedYear => "Graduated Year",
            Dimension::Country => "Country",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One (dimension, value) pair picked in the side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub dimension: Dimension,
    pub value: Value,
}

// ---------------------------------------------------------------------------
// Choices and drill-down query
// ---------------------------------------------------------------------------

/// Sorted distinct values of `dimension` present in `records`.
/// Empty when there are no records; the caller disables the control.
pub fn dimension_choices(records: &ResultSet, dimension: Dimension) -> Result<Vec<Value>, SectionError> {
    let idx = records.resolve(dimension.column())?;
    Ok(records.distinct(idx).into_iter().collect())
}

pub(crate) fn drill_down_sql(table: &TableName, columns: &[String], column: &str) -> String {
    format!(
        "{} WHERE {} = ?1",
        queries::record_select(table, columns),
        queries::quote_ident(column)
    )
}

/// Records whose `selection.dimension` equals `selection.value`, restricted
/// to the record `columns` the table has.
///
/// The value is bound as `?1`; it never becomes part of the SQL text.
/// A value absent from the data simply matches nothing. A dimension missing
/// from `columns` is a schema mismatch and issues no query.
pub fn drill_down(
    source: &dyn DataSource,
    table: &TableName,
    columns: &[String],
    selection: &FilterSelection,
) -> Result<ResultSet, SectionError> {
    let field = selection.dimension.column();
    let idx = resolve_column(columns, field).ok_or_else(|| SectionError::SchemaMismatch {
        field: field.to_string(),
        available: columns.to_vec(),
    })?;
    let sql = drill_down_sql(table, columns, &columns[idx]);
    Ok(source.query(&sql, std::slice::from_ref(&selection.value))?)
}
