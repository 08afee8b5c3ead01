use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDateTime;
use polars::prelude::*;
use tankgauge_reader::{ReadingColumn, TankReading};

use crate::error::Result;
use crate::pivot::WideReport;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Builds the combined-export frame: the seven source columns in source order,
/// one row per reading.
pub fn readings_to_dataframe(readings: &[TankReading]) -> PolarsResult<DataFrame> {
    let timestamps: Vec<i64> = readings
        .iter()
        .map(|r| r.timestamp.and_utc().timestamp_micros())
        .collect();
    let ts_series = Series::new(ReadingColumn::Timestamp.source_name().into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let tank: Vec<&str> = readings.iter().map(|r| r.tank_name.as_str()).collect();
    let product: Vec<Option<&str>> = readings.iter().map(|r| r.product_name.as_deref()).collect();
    let temp: Vec<Option<f64>> = readings.iter().map(|r| r.product_temp).collect();
    let factor: Vec<Option<f64>> = readings.iter().map(|r| r.correction_factor).collect();
    let gsv: Vec<i64> = readings.iter().map(|r| r.gsv).collect();
    let level: Vec<Option<f64>> = readings.iter().map(|r| r.product_level).collect();

    DataFrame::new(vec![
        ts_series.into(),
        Series::new(ReadingColumn::TankName.source_name().into(), tank).into(),
        Series::new(ReadingColumn::ProductName.source_name().into(), product).into(),
        Series::new(ReadingColumn::ProductTemp.source_name().into(), temp).into(),
        Series::new(ReadingColumn::CorrectionFactor.source_name().into(), factor).into(),
        Series::new(ReadingColumn::Gsv.source_name().into(), gsv).into(),
        Series::new(ReadingColumn::ProductLevel.source_name().into(), level).into(),
    ])
}

/// Writes every reading, in aggregation order, to `path`. Returns the number of
/// rows written.
pub fn write_combined_export(readings: &[TankReading], path: &Path) -> Result<usize> {
    let mut df = readings_to_dataframe(readings)?;
    ensure_parent(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_datetime_format(Some(TIMESTAMP_FORMAT.to_string()))
        .finish(&mut df)?;
    Ok(df.height())
}

/// Reads a combined export back into a frame.
pub fn read_combined_export(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Writes a wide report. Missing measurements become empty fields.
pub fn write_wide_report(report: &WideReport, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(report.header())?;

    for row in &report.rows {
        let mut record: Vec<String> = Vec::with_capacity(report.column_count());
        record.push(format_timestamp(&row.timestamp));
        for block in &row.blocks {
            record.push(block.tank_name.clone());
            record.push(block.product_name.clone().unwrap_or_default());
            record.push(format_decimal(block.product_temp));
            record.push(format_decimal(block.correction_factor));
            record.push(block.gsv.map(|v| v.to_string()).unwrap_or_default());
            record.push(format_decimal(block.product_level));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Decimal text for a measurement; whole numbers keep one fractional digit.
pub fn format_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.1}"),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
