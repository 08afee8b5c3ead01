use std::path::{Path, PathBuf};

use tankgauge_reader::{read_with_drivers, SourceDriver, TankReading};
use tracing::{info, warn};

use crate::discovery::{discover_source_files, DiscoveryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Parsed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub rows: usize,
    pub message: Option<String>,
}

/// All readings from one batch plus what happened to each source file.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub readings: Vec<TankReading>,
    pub reports: Vec<FileReport>,
}

impl Aggregation {
    /// True when no file contributed a single reading.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn files_found(&self) -> usize {
        self.reports.len()
    }

    pub fn processed_files(&self) -> usize {
        self.count(FileStatus::Parsed)
    }

    pub fn failed_files(&self) -> usize {
        self.count(FileStatus::Failed)
    }

    pub fn total_records(&self) -> usize {
        self.readings.len()
    }

    fn count(&self, status: FileStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// Finds every source file under `root` and concatenates their readings.
///
/// Only a missing root is an error. Files that cannot be opened or read are
/// logged, reported as [`FileStatus::Failed`] and skipped.
pub fn combine(
    root: &Path,
    extensions: &[String],
    table: &str,
    drivers: &[&dyn SourceDriver],
) -> Result<Aggregation, DiscoveryError> {
    combine_with_progress(root, extensions, table, drivers, |_| {})
}

/// Like [`combine`], calling `on_file` with each file's report as soon as that
/// file has been read.
pub fn combine_with_progress<F>(
    root: &Path,
    extensions: &[String],
    table: &str,
    drivers: &[&dyn SourceDriver],
    on_file: F,
) -> Result<Aggregation, DiscoveryError>
where
    F: FnMut(&FileReport),
{
    let paths = discover_source_files(root, extensions)?;
    info!(root = %root.display(), files = paths.len(), "discovered source files");
    Ok(combine_files_with_progress(&paths, table, drivers, on_file))
}

/// Reads `paths` in order and concatenates their readings without
/// deduplication.
pub fn combine_files(paths: &[PathBuf], table: &str, drivers: &[&dyn SourceDriver]) -> Aggregation {
    combine_files_with_progress(paths, table, drivers, |_| {})
}

pub fn combine_files_with_progress<F>(
    paths: &[PathBuf],
    table: &str,
    drivers: &[&dyn SourceDriver],
    mut on_file: F,
) -> Aggregation
where
    F: FnMut(&FileReport),
{
    let mut aggregation = Aggregation::default();

    for path in paths {
        let report = match read_with_drivers(path, table, drivers) {
            Ok(mut readings) => {
                info!(path = %path.display(), rows = readings.len(), "processed source file");
                let rows = readings.len();
                aggregation.readings.append(&mut readings);
                FileReport {
                    path: path.clone(),
                    status: FileStatus::Parsed,
                    rows,
                    message: None,
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping source file");
                FileReport {
                    path: path.clone(),
                    status: FileStatus::Failed,
                    rows: 0,
                    message: Some(err.to_string()),
                }
            }
        };
        on_file(&report);
        aggregation.reports.push(report);
    }

    if aggregation.is_empty() {
        warn!(files = paths.len(), table, "no source file yielded any readings");
    } else {
        info!(
            files = aggregation.processed_files(),
            skipped = aggregation.failed_files(),
            records = aggregation.total_records(),
            "combined source files"
        );
    }

    aggregation
}
