use thiserror::Error;

/// Failure reported by a [`crate::data::source::DataSource`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// The source could not be reached or is not a database at all.
    /// Fatal to the current run.
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<rusqlite::Error> for SourceError {
    fn from(value: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        match value.sqlite_error_code() {
            Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => {
                Self::Connection(value.to_string())
            }
            _ => Self::Query(value.to_string()),
        }
    }
}

/// Why one section of the page could not be rendered. Recovered locally:
/// the section shows a message and the rest of the page carries on.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SectionError {
    #[error("column '{field}' not found (result has: {})", .available.join(", "))]
    SchemaMismatch {
        field: String,
        available: Vec<String>,
    },
    #[error("column '{field}' holds {value}, expected a count")]
    NotACount { field: String, value: String },
    #[error("no data")]
    EmptyResult,
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl SectionError {
    /// Informational rather than a warning.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, SectionError::EmptyResult)
    }

    /// Connection failures abort the whole run.
    pub fn into_fatal(self) -> Result<SectionError, SourceError> {
        match self {
            SectionError::Source(e @ SourceError::Connection(_)) => Err(e),
            other => Ok(other),
        }
    }
}
