use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct DriverAttempt {
    pub driver: &'static str,
    pub message: String,
}

impl DriverAttempt {
    pub fn new(driver: &'static str, message: impl Into<String>) -> Self {
        Self {
            driver,
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.driver, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("source file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("{driver} is not available: {message}")]
    DriverUnavailable {
        driver: &'static str,
        message: String,
    },

    #[error("{driver} failed on {}: {message}", path.display())]
    Driver {
        driver: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("table '{table}' not found; available tables: {available:?}")]
    TableNotFound {
        table: String,
        available: Vec<String>,
    },

    #[error("table '{table}' is missing column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("{driver} CSV error: {source}")]
    Csv {
        driver: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("table '{table}' data row {row_index} invalid: {message}")]
    DataRow {
        table: String,
        row_index: usize,
        message: String,
    },

    #[error("no source driver could open this file; attempts: {attempts:?}")]
    NoUsableDriver { attempts: Vec<DriverAttempt> },
}
