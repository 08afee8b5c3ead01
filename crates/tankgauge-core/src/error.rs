// crates/tankgauge-core/src/error.rs

use tankgauge_reader::ReaderError;
use thiserror::Error;

use crate::discovery::DiscoveryError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Source read failed: {0}")]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Configuration file could not be parsed: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration invalid: {0}")]
    Config(String),

    #[error("No valid grade selected")]
    NoGradeSelected,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
