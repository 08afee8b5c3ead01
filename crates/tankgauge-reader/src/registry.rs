use std::path::Path;

use crate::errors::{DriverAttempt, ReaderError};
use crate::model::TankReading;
use crate::source::{read_readings, SourceDriver};

/// Reads `table` from `path` with the first driver that is available. A driver
/// that cannot be launched is recorded and the next one tried; any other
/// failure is returned as-is.
pub fn read_with_drivers(
    path: &Path,
    table: &str,
    drivers: &[&dyn SourceDriver],
) -> Result<Vec<TankReading>, ReaderError> {
    let mut attempts = Vec::new();

    for driver in drivers {
        match read_readings(*driver, path, table) {
            Ok(readings) => return Ok(readings),
            Err(ReaderError::DriverUnavailable { driver, message }) => {
                attempts.push(DriverAttempt::new(driver, message));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ReaderError::NoUsableDriver { attempts })
}

pub fn list_tables_with_drivers(
    path: &Path,
    drivers: &[&dyn SourceDriver],
) -> Result<Vec<String>, ReaderError> {
    if !path.is_file() {
        return Err(ReaderError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let mut attempts = Vec::new();

    for driver in drivers {
        match driver.open(path) {
            Ok(mut connection) => return connection.tables(),
            Err(ReaderError::DriverUnavailable { driver, message }) => {
                attempts.push(DriverAttempt::new(driver, message));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ReaderError::NoUsableDriver { attempts })
}
