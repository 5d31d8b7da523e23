use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ResultSet, Value};
use super::queries::{TableName, quote_ident};
use super::source::SqliteSource;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Open a data source from a path.  Dispatch by extension.
///
/// Supported formats:
/// * `.db` / `.sqlite` / `.sqlite3` / `.db3` – opened as-is (read-only)
/// * `.parquet` / `.pq` – imported into an in-memory table
/// * `.json` – `[{ "MAJOR": "CS", ... }, ...]`, imported
/// * `.csv` – header row plus records, imported
pub fn open_source(path: &Path, table: &TableName) -> Result<SqliteSource> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "db" | "sqlite" | "sqlite3" | "db3" => Ok(SqliteSource::open(path)?),
        "parquet" | "pq" | "json" | "csv" => {
            let rows = load_file(path)?;
            let label = path.display().to_string();
            let mut source = SqliteSource::in_memory(label)?;
            import_table(&mut source, table, &rows)
                .with_context(|| format!("importing {} into table {table}", path.display()))?;
            Ok(source)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Parse a flat file into rows. Columns keep the order they were first seen.
pub fn load_file(path: &Path) -> Result<ResultSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        rows.len(),
        rows.columns,
        path.display()
    );
    Ok(rows)
}

/// Create `table` in the source and insert every row through bound
/// parameters, inside one transaction.
pub fn import_table(source: &mut SqliteSource, table: &TableName, rows: &ResultSet) -> Result<()> {
    if rows.columns.is_empty() {
        bail!("no columns to import");
    }
    let column_list = rows
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=rows.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = source
        .connection_mut()
        .transaction()
        .context("starting import transaction")?;
    tx.execute(&format!("CREATE TABLE {table} ({column_list})"), [])
        .context("creating table")?;
    {
        let mut insert = tx
            .prepare(&format!(
                "INSERT INTO {table} ({column_list}) VALUES ({placeholders})"
            ))
            .context("preparing insert")?;
        for (row_no, row) in rows.rows.iter().enumerate() {
            let cells = (0..rows.columns.len()).map(|c| rows.cell(row_no, c));
            insert
                .execute(rusqlite::params_from_iter(cells))
                .with_context(|| format!("inserting row {row_no}"))?;
        }
    }
    tx.commit().context("committing import")?;
    Ok(())
}

/// Accumulates records whose column sets may differ between rows.
#[derive(Default)]
struct RowBuilder {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl RowBuilder {
    fn push(&mut self, record: impl IntoIterator<Item = (String, Value)>) {
        let mut row = vec![Value::Null; self.columns.len()];
        for (name, value) in record {
            let idx = match self.index.get(&name) {
                Some(&idx) => idx,
                None => {
                    let idx = self.columns.len();
                    self.index.insert(name.clone(), idx);
                    self.columns.push(name);
                    idx
                }
            };
            if idx >= row.len() {
                row.resize(idx + 1, Value::Null);
            }
            row[idx] = value;
        }
        self.rows.push(row);
    }

    fn finish(self) -> ResultSet {
        let width = self.columns.len();
        let rows = self
            .rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Value::Null);
                r
            })
            .collect();
        ResultSet::new(self.columns, rows)
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "FANID": 1, "MAJOR": "CS", "COUNTRY": "Kenya", "GRADUATED_YEAR": 2021 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<ResultSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut builder = RowBuilder::default();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        builder.push(obj.iter().map(|(k, v)| (k.clone(), json_to_value(v))));
    }

    Ok(builder.finish())
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Cell types are guessed per cell.
fn load_csv(path: &Path) -> Result<ResultSet> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_value_type).collect());
    }

    Ok(ResultSet::new(headers, rows))
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding the student table.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Columns of unsupported types are
/// imported as their type name.
fn load_parquet(path: &Path) -> Result<ResultSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_value(col, row))
                    .collect(),
            );
        }
    }

    Ok(ResultSet::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| Value::Text(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| Value::Text(s.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| Value::Integer(i64::from(a.value(row)))),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| Value::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| Value::Float(f64::from(a.value(row)))),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| Value::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| Value::Bool(a.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| Value::Text(format!("{:?}", col.data_type())))
}
