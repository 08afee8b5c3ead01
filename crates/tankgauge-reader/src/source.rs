use std::path::Path;

use tracing::debug;

use crate::errors::ReaderError;
use crate::model::{RawTable, TankReading, READING_COLUMNS};
use crate::normalize::readings_from_table;

/// Something that can open a legacy database file.
pub trait SourceDriver {
    fn name(&self) -> &'static str;

    /// Opens `path`. The returned connection is released when dropped, on every
    /// exit path of the caller.
    fn open(&self, path: &Path) -> Result<Box<dyn SourceConnection>, ReaderError>;
}

/// An open handle on one database file.
pub trait SourceConnection {
    fn tables(&mut self) -> Result<Vec<String>, ReaderError>;

    /// Reads every column of `table` as text.
    fn read_table(&mut self, table: &str) -> Result<RawTable, ReaderError>;

    /// Reads `columns` of `table`. Fails with [`ReaderError::TableNotFound`]
    /// before touching the data when the table does not exist.
    fn select(&mut self, table: &str, columns: &[&str]) -> Result<RawTable, ReaderError> {
        let available = self.tables()?;
        let Some(actual) = available
            .iter()
            .find(|name| name.eq_ignore_ascii_case(table))
            .cloned()
        else {
            return Err(ReaderError::TableNotFound {
                table: table.to_string(),
                available,
            });
        };

        let raw = self.read_table(&actual)?;
        raw.project(columns)
    }
}

/// Opens `path` with `driver`, reads the gauge table and normalizes it. The
/// connection does not outlive this call.
pub fn read_readings(
    driver: &dyn SourceDriver,
    path: &Path,
    table: &str,
) -> Result<Vec<TankReading>, ReaderError> {
    if !path.is_file() {
        return Err(ReaderError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let mut connection = driver.open(path)?;
    let raw = connection.select(table, &READING_COLUMNS)?;
    debug!(
        driver = driver.name(),
        path = %path.display(),
        rows = raw.height(),
        "read source table"
    );
    readings_from_table(&raw)
}
