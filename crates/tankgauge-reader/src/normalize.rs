use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::errors::ReaderError;
use crate::model::{RawTable, ReadingColumn, TankReading, READING_COLUMNS};

/// Width of the timestamp grid readings are snapped to.
pub const TIMESTAMP_BUCKET_MICROS: i64 = 2 * 60 * 1_000_000;

/// Snaps a timestamp to the nearest two-minute boundary. A value exactly halfway
/// between two boundaries goes to the even bucket.
pub fn quantize_timestamp(ts: NaiveDateTime) -> NaiveDateTime {
    let micros = ts.and_utc().timestamp_micros();
    let floor = micros.div_euclid(TIMESTAMP_BUCKET_MICROS);
    let rem = micros.rem_euclid(TIMESTAMP_BUCKET_MICROS);

    let bucket = match (rem * 2).cmp(&TIMESTAMP_BUCKET_MICROS) {
        Ordering::Less => floor,
        Ordering::Greater => floor + 1,
        Ordering::Equal if floor.rem_euclid(2) == 0 => floor,
        Ordering::Equal => floor + 1,
    };

    DateTime::from_timestamp_micros(bucket * TIMESTAMP_BUCKET_MICROS)
        .map(|dt| dt.naive_utc())
        .unwrap_or(ts)
}

/// Two decimal places, half-way cases to even.
pub fn round_temperature(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Drops the fractional part of a GSV value (truncation toward zero, not
/// rounding).
pub fn truncate_gsv(value: f64) -> Option<i64> {
    if value.is_finite() {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    static FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    let trimmed = value.trim();
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn clean_optional(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_optional_f64(
    table: &str,
    value: &str,
    row_index: usize,
    column: ReadingColumn,
) -> Result<Option<f64>, ReaderError> {
    let Some(trimmed) = clean_optional(value) else {
        return Ok(None);
    };
    if trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|err| ReaderError::DataRow {
            table: table.to_string(),
            row_index,
            message: format!("failed to parse column '{column}' as decimal: {err}"),
        })
}

/// Turns a projected table (columns in [`READING_COLUMNS`] order) into typed,
/// normalized readings.
pub fn readings_from_table(raw: &RawTable) -> Result<Vec<TankReading>, ReaderError> {
    let in_order = raw.headers.len() == READING_COLUMNS.len()
        && raw
            .headers
            .iter()
            .zip(READING_COLUMNS)
            .all(|(header, column)| header.trim().eq_ignore_ascii_case(column));
    if !in_order {
        let projected = raw.project(&READING_COLUMNS)?;
        return readings_from_table(&projected);
    }

    let table = raw.table.as_str();
    let mut readings = Vec::with_capacity(raw.height());

    for (row_index, row) in raw.rows.iter().enumerate() {
        let cell = |column: ReadingColumn| row.get(column.index()).map(String::as_str).unwrap_or("");
        let row_error = |message: String| ReaderError::DataRow {
            table: table.to_string(),
            row_index,
            message,
        };

        let ts_raw = cell(ReadingColumn::Timestamp);
        let timestamp = parse_timestamp(ts_raw)
            .map(quantize_timestamp)
            .ok_or_else(|| row_error(format!("invalid timestamp '{}'", ts_raw.trim())))?;

        let tank_name = clean_optional(cell(ReadingColumn::TankName))
            .ok_or_else(|| row_error("missing tank name".to_string()))?
            .to_string();

        let product_name = clean_optional(cell(ReadingColumn::ProductName)).map(str::to_string);

        let product_temp = parse_optional_f64(
            table,
            cell(ReadingColumn::ProductTemp),
            row_index,
            ReadingColumn::ProductTemp,
        )?
        .map(round_temperature);

        let correction_factor = parse_optional_f64(
            table,
            cell(ReadingColumn::CorrectionFactor),
            row_index,
            ReadingColumn::CorrectionFactor,
        )?;

        let gsv = parse_optional_f64(table, cell(ReadingColumn::Gsv), row_index, ReadingColumn::Gsv)?
            .and_then(truncate_gsv)
            .ok_or_else(|| row_error("GSV is missing or not a finite number".to_string()))?;

        let product_level = parse_optional_f64(
            table,
            cell(ReadingColumn::ProductLevel),
            row_index,
            ReadingColumn::ProductLevel,
        )?;

        readings.push(TankReading {
            timestamp,
            tank_name,
            product_name,
            product_temp,
            correction_factor,
            gsv,
            product_level,
        });
    }

    Ok(readings)
}
