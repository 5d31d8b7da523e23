use std::path::Path;

use crate::config::DashboardConfig;
use crate::data::filter::{Dimension, FilterSelection, dimension_choices, drill_down};
use crate::data::loader;
use crate::data::model::{Aggregate, ResultSet, Value};
use crate::data::queries::{self, TableName};
use crate::data::source::DataSource;
use crate::error::{SectionError, SourceError};

// ---------------------------------------------------------------------------
// One run of the page
// ---------------------------------------------------------------------------

/// Outcome of one section of the page: its data or the message shown in
/// its place.
pub type Section<T> = Result<T, SectionError>;

/// Header metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub students: Section<usize>,
    pub countries: Section<usize>,
    pub majors: Section<usize>,
    pub years: Section<usize>,
}

/// Everything the page shows, computed from scratch by [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub metrics: Metrics,
    /// Values offered for the active dimension. Empty → control disabled.
    pub choices: Section<Vec<Value>>,
    /// The drill-down actually applied, if any.
    pub applied: Option<FilterSelection>,
    /// Record table (drilled down when `applied` is set).
    pub records: Section<ResultSet>,
    pub by_major: Section<Aggregate>,
    pub by_status: Section<Aggregate>,
    pub by_country: Section<Aggregate>,
    pub by_year: Section<Aggregate>,
}

/// Recompute the whole page. Queries run one after another on `source`.
///
/// Section failures are kept in the view; only a connection failure aborts
/// the run.
pub fn run(
    source: &dyn DataSource,
    table: &TableName,
    dimension: Dimension,
    selected: Option<&Value>,
) -> Result<DashboardView, SourceError> {
    let all_records = settle(
        "records",
        queries::record_columns(source, table)
            .and_then(|columns| queries::load_records(source, table, &columns)),
    )?;

    let metrics = Metrics {
        students: all_records.as_ref().map(ResultSet::len).map_err(Clone::clone),
        countries: distinct(&all_records, queries::COUNTRY),
        majors: distinct(&all_records, queries::MAJOR),
        years: distinct(&all_records, queries::GRADUATED_YEAR),
    };

    let choices = all_records
        .as_ref()
        .map_err(Clone::clone)
        .and_then(|rs| dimension_choices(rs, dimension));

    // No choices means no control and no query.
    let applied = match (&choices, selected) {
        (Ok(values), Some(value)) if !values.is_empty() => Some(FilterSelection {
            dimension,
            value: value.clone(),
        }),
        _ => None,
    };
    let records = match &applied {
        Some(selection) => {
            // a selection is only applied when the record set loaded
            let columns = all_records
                .as_ref()
                .map(|rs| rs.columns.clone())
                .unwrap_or_default();
            settle("drill-down", drill_down(source, table, &columns, selection))?
        }
        None => all_records,
    };

    Ok(DashboardView {
        metrics,
        choices,
        applied,
        records,
        by_major: settle("by major", non_empty(queries::count_by_major(source, table)))?,
        by_status: settle("by status", non_empty(queries::count_by_status(source, table)))?,
        by_country: settle("by country", non_empty(queries::count_by_country(source, table)))?,
        by_year: settle("by year", non_empty(queries::count_by_year(source, table)))?,
    })
}

/// Keep a section failure in the view, escalating connection failures.
fn settle<T>(name: &str, section: Section<T>) -> Result<Section<T>, SourceError> {
    match section {
        Ok(v) => Ok(Ok(v)),
        Err(e) => {
            let e = e.into_fatal()?;
            if e.is_empty_result() {
                log::info!("section {name}: {e}");
            } else {
                log::warn!("section {name}: {e}");
            }
            Ok(Err(e))
        }
    }
}

fn non_empty(section: Section<Aggregate>) -> Section<Aggregate> {
    match section {
        Ok(agg) if agg.is_empty() => Err(SectionError::EmptyResult),
        other => other,
    }
}

fn distinct(records: &Section<ResultSet>, field: &str) -> Section<usize> {
    records
        .as_ref()
        .map_err(Clone::clone)
        .and_then(|rs| queries::distinct_count(rs, field))
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct Dashboard {
    pub title: String,
    pub table: TableName,

    /// Open data source (None until the user opens one).
    pub source: Option<Box<dyn DataSource>>,

    /// Dimension offered in the filter control.
    pub dimension: Dimension,

    /// Selected value, `None` meaning "All".
    pub selected: Option<Value>,

    /// Result of the latest run.
    pub view: Option<DashboardView>,

    /// Page-level error shown instead of the sections.
    pub page_error: Option<String>,

    /// Status message shown in the top bar (load failures).
    pub status_message: Option<String>,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            title: config.title.clone(),
            table: config.table.clone(),
            source: None,
            dimension: Dimension::Major,
            selected: None,
            view: None,
            page_error: None,
            status_message: None,
        }
    }

    /// Replace the data source (dropping and closing the old one) and run.
    pub fn set_source(&mut self, source: Box<dyn DataSource>) {
        log::info!("Using {}", source.describe());
        self.source = Some(source);
        self.selected = None;
        self.status_message = None;
        self.rerun();
    }

    /// Open a SQLite database or import a data file as the new source.
    /// Failures leave the current source in place and set the status message.
    pub fn open_path(&mut self, path: &Path) {
        match loader::open_source(path, &self.table) {
            Ok(source) => self.set_source(Box::new(source)),
            Err(e) => {
                log::error!("Failed to open {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn select_dimension(&mut self, dimension: Dimension) {
        if dimension != self.dimension {
            self.dimension = dimension;
            self.selected = None;
            self.rerun();
        }
    }

    pub fn select_value(&mut self, value: Option<Value>) {
        if value != self.selected {
            self.selected = value;
            self.rerun();
        }
    }

    /// Recompute the view from scratch.
    pub fn rerun(&mut self) {
        let Some(source) = &self.source else {
            self.view = None;
            return;
        };
        match run(source.as_ref(), &self.table, self.dimension, self.selected.as_ref()) {
            Ok(view) => {
                self.view = Some(view);
                self.page_error = None;
            }
            Err(e) => {
                log::error!("Run aborted: {e}");
                self.view = None;
                self.page_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::queries::tests::student_db;
    use crate::data::source::tests::RecordingSource;
    use crate::data::source::SqliteSource;

    fn sample() -> SqliteSource {
        student_db(&[
            (1, "Amani", "Otieno", "CS", "Kenya", "Graduated", 2021),
            (2, "Liam", "O'Brien", "Math", "Ireland", "Enrolled", 2023),
            (3, "Wanjiru", "Kamau", "CS", "Kenya", "Graduated", 2020),
        ])
    }

    #[test]
    fn full_run_fills_every_section() {
        let db = sample();
        let view = run(&db, &TableName::default(), Dimension::Country, None).unwrap();
        assert_eq!(view.metrics.students, Ok(3));
        assert_eq!(view.metrics.countries, Ok(2));
        assert_eq!(view.metrics.majors, Ok(2));
        assert_eq!(view.metrics.years, Ok(3));
        assert_eq!(view.choices, Ok(vec![Value::from("Ireland"), Value::from("Kenya")]));
        assert!(view.applied.is_none());
        assert_eq!(view.records.as_ref().map(ResultSet::len), Ok(3));
        assert_eq!(view.by_major.as_ref().map(Aggregate::len), Ok(2));
        assert_eq!(view.by_status.as_ref().map(Aggregate::total), Ok(3));
        assert_eq!(view.by_country.as_ref().map(Aggregate::len), Ok(2));
        assert_eq!(view.by_year.as_ref().map(Aggregate::len), Ok(3));
    }

    #[test]
    fn selection_drills_down() {
        let db = sample();
        let kenya = Value::from("Kenya");
        let view = run(&db, &TableName::default(), Dimension::Country, Some(&kenya)).unwrap();
        assert_eq!(view.records.as_ref().map(ResultSet::len), Ok(2));
        assert_eq!(view.applied.map(|s| s.value), Some(kenya));
        // aggregates always cover the whole table
        assert_eq!(view.by_country.as_ref().map(Aggregate::total), Ok(3));
    }

    #[test]
    fn empty_table_degrades_without_errors() {
        let db = student_db(&[]);
        let stale = Value::from("Kenya");
        let view = run(&db, &TableName::default(), Dimension::Country, Some(&stale)).unwrap();
        assert_eq!(view.metrics.students, Ok(0));
        assert_eq!(view.metrics.countries, Ok(0));
        assert_eq!(view.choices, Ok(Vec::new()));
        assert!(view.applied.is_none());
        assert_eq!(view.records.as_ref().map(ResultSet::is_empty), Ok(true));
        assert_eq!(view.by_major, Err(SectionError::EmptyResult));
        assert_eq!(view.by_year, Err(SectionError::EmptyResult));
    }

    #[test]
    fn missing_column_only_breaks_dependent_sections() {
        let mut db = SqliteSource::in_memory("no-country").unwrap();
        db.connection_mut()
            .execute_batch(
                "CREATE TABLE cleaned_data (FANID, FIRST_NAME, LAST_NAME, MAJOR,
                                            ENROLLMENT_STATUS, GRADUATED_YEAR);
                 INSERT INTO cleaned_data VALUES (1, 'A', 'B', 'CS', 'Enrolled', 2024);",
            )
            .unwrap();
        let view = run(&db, &TableName::default(), Dimension::Major, None).unwrap();
        assert_eq!(view.metrics.students, Ok(1));
        assert_eq!(view.metrics.majors, Ok(1));
        assert_eq!(view.metrics.years, Ok(1));
        assert!(matches!(
            &view.metrics.countries,
            Err(SectionError::SchemaMismatch { field, .. }) if field == queries::COUNTRY
        ));
        assert_eq!(view.choices, Ok(vec![Value::from("CS")]));
        assert_eq!(view.records.as_ref().map(|rs| rs.columns.len()), Ok(6));
        assert!(matches!(view.by_country, Err(SectionError::Source(SourceError::Query(_)))));
        assert_eq!(view.by_major.as_ref().map(Aggregate::len), Ok(1));
        assert_eq!(view.by_status.as_ref().map(Aggregate::len), Ok(1));
        assert_eq!(view.by_year.as_ref().map(Aggregate::len), Ok(1));
    }

    #[test]
    fn drill_down_on_a_missing_column_stays_in_its_section() {
        let mut db = SqliteSource::in_memory("no-country").unwrap();
        db.connection_mut()
            .execute_batch(
                "CREATE TABLE cleaned_data (FANID, MAJOR, ENROLLMENT_STATUS);
                 INSERT INTO cleaned_data VALUES (1, 'CS', 'Enrolled');",
            )
            .unwrap();
        let kenya = Value::from("Kenya");
        let view = run(&db, &TableName::default(), Dimension::Country, Some(&kenya)).unwrap();
        assert!(matches!(view.choices, Err(SectionError::SchemaMismatch { .. })));
        assert!(view.applied.is_none());
        assert_eq!(view.records.as_ref().map(ResultSet::len), Ok(1));
        assert_eq!(view.metrics.students, Ok(1));
    }

    #[test]
    fn connection_failure_aborts_the_run() {
        let src = RecordingSource::answering(Err(SourceError::Connection("refused".into())));
        let err = run(&src, &TableName::default(), Dimension::Major, None).unwrap_err();
        assert_eq!(err, SourceError::Connection("refused".into()));
        assert_eq!(src.calls.borrow().len(), 1);
    }

    #[test]
    fn dashboard_resets_selection_on_dimension_change() {
        let mut dash = Dashboard::new(&DashboardConfig::default());
        dash.set_source(Box::new(sample()));
        dash.select_value(Some(Value::from("CS")));
        assert!(dash.view.as_ref().unwrap().applied.is_some());

        dash.select_dimension(Dimension::GraduatedYear);
        assert!(dash.selected.is_none());
        let view = dash.view.as_ref().unwrap();
        assert!(view.applied.is_none());
        assert_eq!(
            view.choices,
            Ok(vec![Value::Integer(2020), Value::Integer(2021), Value::Integer(2023)])
        );
    }

    #[test]
    fn failed_open_keeps_current_source() {
        let mut dash = Dashboard::new(&DashboardConfig::default());
        dash.set_source(Box::new(sample()));
        dash.open_path(Path::new("students.xlsx"));
        assert!(dash.status_message.as_deref().unwrap().contains(".xlsx"));
        assert!(dash.view.is_some());
    }

    #[test]
    fn opening_a_csv_runs_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");
        std::fs::write(
            &path,
            "FANID,FIRST_NAME,LAST_NAME,major,Country,ENROLLMENT_STATUS,GRADUATED_YEAR,EMAIL\n\
             1,Ada,Lovelace,CS,UK,Graduated,2021,ada@example.com\n\
             2,Alan,Turing,Math,UK,Graduated,2020,alan@example.com\n",
        )
        .unwrap();
        let mut dash = Dashboard::new(&DashboardConfig::default());
        dash.open_path(&path);
        let view = dash.view.as_ref().unwrap();
        assert_eq!(view.metrics.students, Ok(2));
        assert_eq!(view.by_major.as_ref().map(Aggregate::len), Ok(2));
    }

    #[test]
    fn page_error_replaces_view() {
        let mut dash = Dashboard::new(&DashboardConfig::default());
        dash.set_source(Box::new(RecordingSource::answering(Err(
            SourceError::Connection("refused".into()),
        ))));
        assert!(dash.view.is_none());
        assert_eq!(dash.page_error.as_deref(), Some("connection failed: refused"));
    }
}
