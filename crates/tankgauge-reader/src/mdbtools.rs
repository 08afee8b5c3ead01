//! Reads Access `.mdb` files through the `mdbtools` command line programs.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use csv::ReaderBuilder;
use tracing::debug;

use crate::errors::ReaderError;
use crate::model::RawTable;
use crate::source::{SourceConnection, SourceDriver};

const DRIVER: &str = "mdbtools";
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";
const EXPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Default)]
pub struct MdbToolsDriver {
    bin_dir: Option<PathBuf>,
    connect_timeout: Option<Duration>,
}

impl MdbToolsDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding `mdb-tables` and `mdb-export`; `PATH` is used when unset.
    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(dir.into());
        self
    }

    /// Upper bound on the table listing performed when a file is opened.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    fn program(&self, name: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

impl SourceDriver for MdbToolsDriver {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn open(&self, path: &Path) -> Result<Box<dyn SourceConnection>, ReaderError> {
        let mut command = Command::new(self.program("mdb-tables"));
        command.arg("-1").arg(path);
        let output = run(&mut command, self.connect_timeout, path)?;
        let tables = parse_table_list(&output.stdout);
        debug!(path = %path.display(), tables = tables.len(), "opened mdb file");

        Ok(Box::new(MdbConnection {
            export_program: self.program("mdb-export"),
            path: path.to_path_buf(),
            tables,
        }))
    }
}

struct MdbConnection {
    export_program: PathBuf,
    path: PathBuf,
    tables: Vec<String>,
}

impl SourceConnection for MdbConnection {
    fn tables(&mut self) -> Result<Vec<String>, ReaderError> {
        Ok(self.tables.clone())
    }

    fn read_table(&mut self, table: &str) -> Result<RawTable, ReaderError> {
        let mut command = Command::new(&self.export_program);
        command
            .arg("-D")
            .arg(EXPORT_DATE_FORMAT)
            .arg("-T")
            .arg(EXPORT_DATETIME_FORMAT)
            .arg(&self.path)
            .arg(table);
        let output = run(&mut command, None, &self.path)?;
        parse_export(table, &output.stdout)
    }
}

impl Drop for MdbConnection {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "closed mdb file");
    }
}

fn run(command: &mut Command, timeout: Option<Duration>, path: &Path) -> Result<Output, ReaderError> {
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let child = command.spawn().map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            ReaderError::DriverUnavailable {
                driver: DRIVER,
                message: format!("{} not found: {err}", command.get_program().to_string_lossy()),
            }
        } else {
            driver_error(path, format!("failed to launch: {err}"))
        }
    })?;

    let output = match timeout {
        Some(limit) => wait_with_deadline(child, limit, path)?,
        None => child
            .wait_with_output()
            .map_err(|err| driver_error(path, err.to_string()))?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(driver_error(
            path,
            format!("exited with {}: {}", output.status, stderr.trim_end()),
        ));
    }

    Ok(output)
}

// Only used for the table listing, whose output stays well under the pipe
// buffer, so polling without draining stdout cannot stall the child.
fn wait_with_deadline(mut child: Child, limit: Duration, path: &Path) -> Result<Output, ReaderError> {
    let deadline = Instant::now() + limit;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let mut stdout = Vec::new();
                let mut stderr = Vec::new();
                if let Some(mut out) = child.stdout.take() {
                    out.read_to_end(&mut stdout)
                        .map_err(|err| driver_error(path, err.to_string()))?;
                }
                if let Some(mut err_pipe) = child.stderr.take() {
                    err_pipe
                        .read_to_end(&mut stderr)
                        .map_err(|err| driver_error(path, err.to_string()))?;
                }
                return Ok(Output {
                    status,
                    stdout,
                    stderr,
                });
            }
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(driver_error(
                    path,
                    format!("timed out after {}s", limit.as_secs_f64()),
                ));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => return Err(driver_error(path, err.to_string())),
        }
    }
}

fn driver_error(path: &Path, message: String) -> ReaderError {
    ReaderError::Driver {
        driver: DRIVER,
        path: path.to_path_buf(),
        message,
    }
}

/// Parses `mdb-tables -1` output: one table name per line.
pub fn parse_table_list(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `mdb-export` CSV output (header row first) into a raw table.
pub fn parse_export(table: &str, stdout: &[u8]) -> Result<RawTable, ReaderError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(stdout);

    let headers = reader
        .headers()
        .map_err(|source| ReaderError::Csv {
            driver: DRIVER,
            source,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| ReaderError::Csv {
            driver: DRIVER,
            source,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(table, headers, rows))
}
