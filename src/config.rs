use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::queries::TableName;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "STUDENT_DASHBOARD_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// ```toml
/// title = "Student Data Analytics"
/// table = "cleaned_data"
///
/// [source]
/// path = "students.parquet"   # or a SQLite database
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub title: String,
    pub table: TableName,
    pub source: Option<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// SQLite database or flat file; relative paths are taken from the
    /// configuration file's directory.
    pub path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Student Data Analytics".to_string(),
            table: TableName::default(),
            source: None,
        }
    }
}

impl DashboardConfig {
    /// Load from `$STUDENT_DASHBOARD_CONFIG`, else `./dashboard.toml`.
    /// A missing default file yields the defaults; a missing file named by
    /// the environment is an error.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_path(path)
                } else {
                    log::info!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config = Self::parse(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if let (Some(source), Some(dir)) = (config.source.as_mut(), path.parent()) {
            if source.path.is_relative() {
                source.path = dir.join(&source.path);
            }
        }
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = DashboardConfig::parse("").unwrap();
        assert_eq!(config.table.to_string(), "cleaned_data");
        assert_eq!(config.title, "Student Data Analytics");
        assert!(config.source.is_none());
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        let err = DashboardConfig::parse(r#"table = "students; DROP TABLE x""#).unwrap_err();
        assert!(format!("{err:#}").contains("not a valid table name"), "{err:#}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DashboardConfig::parse("passwrod = \"x\"").is_err());
    }

    #[test]
    fn source_path_is_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(
            &path,
            "title = \"Alumni\"\ntable = \"alumni\"\n[source]\npath = \"data/students.csv\"\n",
        )
        .unwrap();

        let config = DashboardConfig::from_path(&path).unwrap();
        assert_eq!(config.title, "Alumni");
        assert_eq!(config.table.to_string(), "alumni");
        assert_eq!(
            config.source.unwrap().path,
            dir.path().join("data/students.csv")
        );
    }
}
