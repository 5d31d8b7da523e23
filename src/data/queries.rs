use std::fmt;

use serde::Deserialize;

use super::model::{Aggregate, AggregateOrder, ResultSet};
use super::schema::resolve_column;
use super::source::DataSource;
use crate::error::SectionError;

// ---------------------------------------------------------------------------
// Student table columns
// ---------------------------------------------------------------------------

pub const FANID: &str = "FANID";
pub const FIRST_NAME: &str = "FIRST_NAME";
pub const LAST_NAME: &str = "LAST_NAME";
pub const MAJOR: &str = "MAJOR";
pub const COUNTRY: &str = "COUNTRY";
pub const ENROLLMENT_STATUS: &str = "ENROLLMENT_STATUS";
pub const GRADUATED_YEAR: &str = "GRADUATED_YEAR";

/// Columns shown in the record table. Anything else in the table
/// (emails, dates of birth, …) is never selected.
pub const RECORD_COLUMNS: [&str; 7] = [
    FANID,
    FIRST_NAME,
    LAST_NAME,
    MAJOR,
    COUNTRY,
    ENROLLMENT_STATUS,
    GRADUATED_YEAR,
];

// ---------------------------------------------------------------------------
// TableName – the only piece of configuration spliced into SQL text
// ---------------------------------------------------------------------------

/// A plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct TableName(String);

impl Default for TableName {
    fn default() -> Self {
        TableName("cleaned_data".to_string())
    }
}

impl TryFrom<String> for TableName {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(TableName(name))
        } else {
            Err(format!("'{name}' is not a valid table name"))
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Record set
// ---------------------------------------------------------------------------

/// Double-quote an identifier read back from the source.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The record columns that `table` actually has, spelled the way the table
/// spells them, in display order.
///
/// Absent columns are left out so the rest of the record set still loads;
/// whatever needs a missing column reports the mismatch itself.
pub fn record_columns(source: &dyn DataSource, table: &TableName) -> Result<Vec<String>, SectionError> {
    let header = source.query(&format!("SELECT * FROM {table} LIMIT 0"), &[])?;
    let present: Vec<String> = RECORD_COLUMNS
        .iter()
        .filter_map(|field| resolve_column(&header.columns, field))
        .map(|idx| header.columns[idx].clone())
        .collect();
    if present.is_empty() {
        return Err(SectionError::SchemaMismatch {
            field: FANID.to_string(),
            available: header.columns,
        });
    }
    for field in RECORD_COLUMNS {
        if resolve_column(&present, field).is_none() {
            log::warn!("{table} has no {field} column");
        }
    }
    Ok(present)
}

pub(crate) fn record_select(table: &TableName, columns: &[String]) -> String {
    let list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {list} FROM {table}")
}

/// Every student record, restricted to `columns` (see [`record_columns`]).
pub fn load_records(
    source: &dyn DataSource,
    table: &TableName,
    columns: &[String],
) -> Result<ResultSet, SectionError> {
    Ok(source.query(&record_select(table, columns), &[])?)
}

/// Number of distinct non-null values of `field` in the record set.
pub fn distinct_count(records: &ResultSet, field: &str) -> Result<usize, SectionError> {
    let idx = records.resolve(field)?;
    Ok(records.distinct(idx).len())
}

// ---------------------------------------------------------------------------
// Aggregation query set
// ---------------------------------------------------------------------------

/// Student count per major, largest first.
pub fn count_by_major(source: &dyn DataSource, table: &TableName) -> Result<Aggregate, SectionError> {
    let sql = format!(
        "SELECT {MAJOR}, COUNT(*) AS student_count FROM {table} \
         GROUP BY {MAJOR} ORDER BY student_count DESC"
    );
    aggregate(source, &sql, MAJOR, "student_count", AggregateOrder::CountDescending)
}

/// Student count per enrollment status, in source order.
pub fn count_by_status(source: &dyn DataSource, table: &TableName) -> Result<Aggregate, SectionError> {
    let sql = format!(
        "SELECT {ENROLLMENT_STATUS}, COUNT(*) AS count FROM {table} GROUP BY {ENROLLMENT_STATUS}"
    );
    aggregate(source, &sql, ENROLLMENT_STATUS, "count", AggregateOrder::AsReturned)
}

/// Student count per country, largest first.
pub fn count_by_country(source: &dyn DataSource, table: &TableName) -> Result<Aggregate, SectionError> {
    let sql = format!(
        "SELECT {COUNTRY}, COUNT(*) AS count FROM {table} GROUP BY {COUNTRY} ORDER BY count DESC"
    );
    aggregate(source, &sql, COUNTRY, "count", AggregateOrder::CountDescending)
}

/// Graduates per year, oldest year first.
pub fn count_by_year(source: &dyn DataSource, table: &TableName) -> Result<Aggregate, SectionError> {
    let sql = format!(
        "SELECT {GRADUATED_YEAR}, COUNT(*) AS count FROM {table} \
         GROUP BY {GRADUATED_YEAR} ORDER BY {GRADUATED_YEAR}"
    );
    aggregate(source, &sql, GRADUATED_YEAR, "count", AggregateOrder::KeyAscending)
}

fn aggregate(
    source: &dyn DataSource,
    sql: &str,
    key_field: &str,
    count_field: &str,
    order: AggregateOrder,
) -> Result<Aggregate, SectionError> {
    let rs = source.query(sql, &[])?;
    aggregate_from(&rs, key_field, count_field, order)
}

/// Turn a `(key, count)` result into an [`Aggregate`], resolving both columns
/// through the schema normalizer.
pub fn aggregate_from(
    rs: &ResultSet,
    key_field: &str,
    count_field: &str,
    order: AggregateOrder,
) -> Result<Aggregate, SectionError> {
    let key = rs.resolve(key_field)?;
    let count = rs.resolve(count_field)?;

    let mut entries = Vec::with_capacity(rs.len());
    for row in 0..rs.len() {
        let raw = rs.cell(row, count);
        let n = raw.as_i64().ok_or_else(|| SectionError::NotACount {
            field: rs.columns[count].clone(),
            value: raw.to_string(),
        })?;
        entries.push((rs.cell(row, key).clone(), n));
    }
    Ok(Aggregate::new(entries, order))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::Value;
    use crate::data::source::tests::RecordingSource;
    use crate::data::source::SqliteSource;
    use crate::error::SourceError;

    /// In-memory student table holding `rows` of
    /// (FANID, FIRST_NAME, LAST_NAME, MAJOR, COUNTRY, ENROLLMENT_STATUS, GRADUATED_YEAR).
    pub(crate) fn student_db(rows: &[(i64, &str, &str, &str, &str, &str, i64)]) -> SqliteSource {
        let mut src = SqliteSource::in_memory("students").unwrap();
        let conn = src.connection_mut();
        conn.execute_batch(
            "CREATE TABLE cleaned_data (
                FANID INTEGER, FIRST_NAME TEXT, LAST_NAME TEXT, MAJOR TEXT,
                COUNTRY TEXT, ENROLLMENT_STATUS TEXT, GRADUATED_YEAR INTEGER,
                EMAIL TEXT
            );",
        )
        .unwrap();
        for (id, first, last, major, country, status, year) in rows {
            conn.execute(
                "INSERT INTO cleaned_data VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'secret@example.com')",
                rusqlite::params![id, first, last, major, country, status, year],
            )
            .unwrap();
        }
        src
    }

    fn keys(agg: &Aggregate) -> Vec<(String, i64)> {
        agg.entries.iter().map(|(k, c)| (k.to_string(), *c)).collect()
    }

    #[test]
    fn majors_count_descending() {
        let db = student_db(&[
            (1, "Ada", "L", "CS", "UK", "Graduated", 2021),
            (2, "Bo", "K", "CS", "UK", "Graduated", 2021),
            (3, "Cy", "J", "Math", "UK", "Enrolled", 2022),
        ]);
        let agg = count_by_major(&db, &TableName::default()).unwrap();
        assert_eq!(keys(&agg), [("CS".to_string(), 2), ("Math".to_string(), 1)]);
    }

    #[test]
    fn years_ascend() {
        let db = student_db(&[
            (1, "A", "A", "CS", "UK", "Graduated", 2021),
            (2, "B", "B", "CS", "UK", "Graduated", 2020),
            (3, "C", "C", "CS", "UK", "Graduated", 2022),
            (4, "D", "D", "CS", "UK", "Graduated", 2021),
        ]);
        let agg = count_by_year(&db, &TableName::default()).unwrap();
        assert_eq!(
            agg.entries,
            vec![
                (Value::Integer(2020), 1),
                (Value::Integer(2021), 2),
                (Value::Integer(2022), 1),
            ]
        );
    }

    #[test]
    fn ordering_does_not_trust_the_source() {
        let rs = ResultSet::new(
            vec!["graduated_year".into(), "Count".into()],
            vec![
                vec![Value::Integer(2022), Value::Integer(1)],
                vec![Value::Integer(2020), Value::Integer(1)],
                vec![Value::Integer(2021), Value::Integer(2)],
            ],
        );
        let src = RecordingSource::answering(Ok(rs));
        let agg = count_by_year(&src, &TableName::default()).unwrap();
        let years: Vec<_> = agg.entries.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(years, [Value::Integer(2020), Value::Integer(2021), Value::Integer(2022)]);
    }

    #[test]
    fn status_and_country_tolerate_mixed_case_columns() {
        let rs = ResultSet::new(
            vec!["Country".into(), "COUNT".into()],
            vec![
                vec!["Kenya".into(), Value::Integer(1)],
                vec!["Peru".into(), Value::Integer(4)],
            ],
        );
        let src = RecordingSource::answering(Ok(rs));
        let agg = count_by_country(&src, &TableName::default()).unwrap();
        assert_eq!(keys(&agg), [("Peru".to_string(), 4), ("Kenya".to_string(), 1)]);
    }

    #[test]
    fn missing_key_column_is_a_schema_mismatch() {
        let rs = ResultSet::new(vec!["STATUS".into(), "count".into()], Vec::new());
        let src = RecordingSource::answering(Ok(rs));
        let err = count_by_status(&src, &TableName::default()).unwrap_err();
        assert!(
            matches!(&err, SectionError::SchemaMismatch { field, .. } if field == ENROLLMENT_STATUS),
            "{err:?}"
        );
    }

    #[test]
    fn non_numeric_count_is_reported() {
        let rs = ResultSet::new(
            vec!["MAJOR".into(), "student_count".into()],
            vec![vec!["CS".into(), "many".into()]],
        );
        let src = RecordingSource::answering(Ok(rs));
        let err = count_by_major(&src, &TableName::default()).unwrap_err();
        assert!(matches!(err, SectionError::NotACount { .. }), "{err:?}");
    }

    #[test]
    fn empty_table_gives_empty_aggregates() {
        let db = student_db(&[]);
        let table = TableName::default();
        assert!(count_by_major(&db, &table).unwrap().is_empty());
        assert!(count_by_status(&db, &table).unwrap().is_empty());
        assert!(count_by_country(&db, &table).unwrap().is_empty());
        assert!(count_by_year(&db, &table).unwrap().is_empty());
    }

    #[test]
    fn records_exclude_sensitive_columns() {
        let db = student_db(&[(1, "Ada", "L", "CS", "UK", "Graduated", 2021)]);
        let table = TableName::default();
        let columns = record_columns(&db, &table).unwrap();
        let rs = load_records(&db, &table, &columns).unwrap();
        assert_eq!(rs.columns, RECORD_COLUMNS);
        assert!(rs.resolve("email").is_err());
        assert_eq!(distinct_count(&rs, "country"), Ok(1));
    }

    #[test]
    fn record_columns_skip_what_the_table_lacks() {
        let mut db = SqliteSource::in_memory("partial").unwrap();
        db.connection_mut()
            .execute_batch(
                "CREATE TABLE cleaned_data (fanid, Major, EMAIL, graduated_year);
                 INSERT INTO cleaned_data VALUES (1, 'CS', 'x@example.com', 2021);",
            )
            .unwrap();
        let table = TableName::default();
        let columns = record_columns(&db, &table).unwrap();
        assert_eq!(columns, ["fanid", "Major", "graduated_year"]);

        let rs = load_records(&db, &table, &columns).unwrap();
        assert_eq!(rs.len(), 1);
        assert_eq!(distinct_count(&rs, MAJOR), Ok(1));
        assert!(matches!(
            distinct_count(&rs, COUNTRY),
            Err(SectionError::SchemaMismatch { field, .. }) if field == COUNTRY
        ));
    }

    #[test]
    fn table_without_record_columns_is_a_mismatch() {
        let mut db = SqliteSource::in_memory("unrelated").unwrap();
        db.connection_mut()
            .execute_batch("CREATE TABLE cleaned_data (EMAIL, PHONE);")
            .unwrap();
        let err = record_columns(&db, &TableName::default()).unwrap_err();
        assert!(matches!(err, SectionError::SchemaMismatch { .. }), "{err:?}");
    }

    #[test]
    fn record_select_quotes_column_names() {
        let columns = vec!["FANID".to_string(), "odd\"name".to_string()];
        assert_eq!(
            record_select(&TableName::default(), &columns),
            "SELECT \"FANID\", \"odd\"\"name\" FROM cleaned_data"
        );
    }

    #[test]
    fn source_errors_pass_through() {
        let src = RecordingSource::answering(Err(SourceError::Query("no such table".into())));
        let err = record_columns(&src, &TableName::default()).unwrap_err();
        assert_eq!(err, SectionError::Source(SourceError::Query("no such table".into())));
    }

    #[test]
    fn table_names_are_plain_identifiers() {
        assert!(TableName::try_from("cleaned_data".to_string()).is_ok());
        assert!(TableName::try_from("_t2".to_string()).is_ok());
        for bad in ["", "2students", "students; DROP TABLE x", "a.b", "name\"", "é"] {
            assert!(TableName::try_from(bad.to_string()).is_err(), "{bad}");
        }
    }
}
