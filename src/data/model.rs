use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell returned by a data source
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the SQLite storage classes.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used for chart axes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view used for counts. Whole floats are accepted because some
    /// warehouses hand back `COUNT(*)` as a NUMBER.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ResultSet – one rectangular query result
// ---------------------------------------------------------------------------

/// Rows returned by one query. Column names keep whatever casing the source
/// produced; look them up through [`ResultSet::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows (it may still have columns).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row`, `column`; `Null` for ragged rows.
    pub fn cell(&self, row: usize, column: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Sorted distinct non-null values of one column.
    pub fn distinct(&self, column: usize) -> BTreeSet<Value> {
        (0..self.rows.len())
            .map(|row| self.cell(row, column))
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Aggregate – category → count
// ---------------------------------------------------------------------------

/// How the entries of an [`Aggregate`] are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOrder {
    /// Largest count first, ties by ascending key.
    CountDescending,
    /// Ascending key (trend views).
    KeyAscending,
    /// Whatever order the source returned.
    AsReturned,
}

/// Counts per dimension value, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub entries: Vec<(Value, i64)>,
}

impl Aggregate {
    pub fn new(mut entries: Vec<(Value, i64)>, order: AggregateOrder) -> Self {
        match order {
            AggregateOrder::CountDescending => {
                entries.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)))
            }
            AggregateOrder::KeyAscending => entries.sort_by(|(ka, _), (kb, _)| ka.cmp(kb)),
            AggregateOrder::AsReturned => {}
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }
}
