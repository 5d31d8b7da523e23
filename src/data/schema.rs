use super::model::ResultSet;
use crate::error::SectionError;

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Find the column that holds the logical `field`.
///
/// Warehouses disagree on identifier casing (`COUNTRY`, `Country`,
/// `country`), so the match is a case-insensitive comparison of the full
/// name. An exact-case hit wins over a folded one; among folded hits the
/// first column wins. Never matches on prefixes or substrings.
pub fn resolve_column<S: AsRef<str>>(columns: &[S], field: &str) -> Option<usize> {
    let mut folded = None;
    for (idx, column) in columns.iter().enumerate() {
        let column = column.as_ref();
        if column == field {
            return Some(idx);
        }
        if folded.is_none() && eq_fold(column, field) {
            folded = Some(idx);
        }
    }
    folded
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl ResultSet {
    /// Resolve `field` against this result's columns.
    pub fn resolve(&self, field: &str) -> Result<usize, SectionError> {
        resolve_column(&self.columns, field).ok_or_else(|| SectionError::SchemaMismatch {
            field: field.to_string(),
            available: self.columns.clone(),
        })
    }
}
