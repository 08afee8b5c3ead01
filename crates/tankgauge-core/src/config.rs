use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::grades::Grade;

pub const ENV_ROOT: &str = "TANKGAUGE_ROOT";
pub const ENV_COMBINED_OUTPUT: &str = "TANKGAUGE_COMBINED_OUTPUT";
pub const ENV_REPORT_DIR: &str = "TANKGAUGE_REPORT_DIR";
pub const ENV_TABLE: &str = "TANKGAUGE_TABLE";

/// Where to look for source files and where to write the exports.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    pub root: PathBuf,
    pub combined_output: PathBuf,
    pub report_dir: PathBuf,
    pub table: String,
    pub extensions: Vec<String>,
    pub mdbtools_dir: Option<PathBuf>,
    pub connect_timeout_secs: Option<u64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            combined_output: PathBuf::from("Combined Tank records.csv"),
            report_dir: PathBuf::from("."),
            table: "TankRecords".to_string(),
            extensions: vec!["mdb".to_string()],
            mdbtools_dir: None,
            connect_timeout_secs: None,
        }
    }
}

impl ExtractorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overrides fields from the `TANKGAUGE_*` variables as seen through
    /// `lookup`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = lookup(ENV_ROOT) {
            self.root = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_COMBINED_OUTPUT) {
            self.combined_output = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_REPORT_DIR) {
            self.report_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_TABLE) {
            self.table = value;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(PipelineError::Config("table name must not be empty".into()));
        }
        if self.extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err(PipelineError::Config(
                "at least one source file extension is required".into(),
            ));
        }
        if self.connect_timeout_secs == Some(0) {
            return Err(PipelineError::Config(
                "connect_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn report_path(&self, grade: Grade) -> PathBuf {
        self.report_dir.join(grade.report_file_name())
    }
}
