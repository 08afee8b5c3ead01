use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::ReaderError;
use crate::model::RawTable;
use crate::source::{SourceConnection, SourceDriver};

const DRIVER: &str = "memory";

/// Serves tables that were loaded ahead of time, keyed by file path.
///
/// A path with no registered tables opens as an empty database, so a table read
/// against it fails the same way a real file without the table would.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    files: BTreeMap<PathBuf, Vec<RawTable>>,
    unavailable: bool,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver that reports itself as not installed on every open.
    pub fn unavailable() -> Self {
        Self {
            files: BTreeMap::new(),
            unavailable: true,
        }
    }

    pub fn insert_table(&mut self, path: impl Into<PathBuf>, table: RawTable) {
        self.files.entry(path.into()).or_default().push(table);
    }

    pub fn with_table(mut self, path: impl Into<PathBuf>, table: RawTable) -> Self {
        self.insert_table(path, table);
        self
    }
}

impl SourceDriver for MemoryDriver {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn open(&self, path: &Path) -> Result<Box<dyn SourceConnection>, ReaderError> {
        if self.unavailable {
            return Err(ReaderError::DriverUnavailable {
                driver: DRIVER,
                message: "driver disabled".to_string(),
            });
        }
        let tables = self.files.get(path).cloned().unwrap_or_default();
        Ok(Box::new(MemoryConnection { tables }))
    }
}

struct MemoryConnection {
    tables: Vec<RawTable>,
}

impl SourceConnection for MemoryConnection {
    fn tables(&mut self) -> Result<Vec<String>, ReaderError> {
        Ok(self.tables.iter().map(|t| t.table.clone()).collect())
    }

    fn read_table(&mut self, table: &str) -> Result<RawTable, ReaderError> {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .cloned()
            .ok_or_else(|| ReaderError::TableNotFound {
                table: table.to_string(),
                available: self.tables.iter().map(|t| t.table.clone()).collect(),
            })
    }
}
