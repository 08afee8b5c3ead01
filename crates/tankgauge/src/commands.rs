use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tankgauge_core::outputs::{format_decimal, format_timestamp, write_combined_export};
use tankgauge_core::{
    combine_with_progress, parse_selection, write_grade_reports, Aggregation, DiscoveryError,
    ExtractorConfig, FileReport, PipelineError,
};
use tankgauge_reader::{
    list_tables_with_drivers, MdbToolsDriver, SourceDriver, TankReading, READING_COLUMNS,
};
use tracing::{info, warn};

use crate::outcome::Outcome;
use crate::prompt::prompt_for_grades;

/// Aggregation result, or the outcome that ended the run before any output.
enum Batch {
    Ready(Aggregation),
    Stopped(Outcome),
}

fn build_driver(config: &ExtractorConfig) -> MdbToolsDriver {
    let mut driver = MdbToolsDriver::new();
    if let Some(dir) = &config.mdbtools_dir {
        driver = driver.with_bin_dir(dir);
    }
    if let Some(timeout) = config.connect_timeout() {
        driver = driver.with_connect_timeout(timeout);
    }
    driver
}

pub fn combine(config: &ExtractorConfig) -> Result<Outcome> {
    let driver = build_driver(config);
    run_combine(config, &[&driver])
}

pub fn report(config: &ExtractorConfig, grades: Option<&str>) -> Result<Outcome> {
    let driver = build_driver(config);
    let stdin = io::stdin();
    run_report(config, grades, &[&driver], stdin.lock(), io::stdout())
}

pub fn tables(config: &ExtractorConfig, file: &Path) -> Result<Outcome> {
    let driver = build_driver(config);
    let drivers: [&dyn SourceDriver; 1] = [&driver];
    let names = list_tables_with_drivers(file, &drivers)
        .with_context(|| format!("failed to list tables in {}", file.display()))?;

    info!(path = %file.display(), tables = names.len(), "listed tables");
    for name in names {
        println!("{name}");
    }
    Ok(Outcome::Success)
}

pub fn preview(config: &ExtractorConfig, rows: usize) -> Result<Outcome> {
    let driver = build_driver(config);
    let aggregation = match gather(config, &[&driver])? {
        Batch::Ready(aggregation) => aggregation,
        Batch::Stopped(outcome) => return Ok(outcome),
    };

    println!("{}", preview_table(&aggregation.readings, rows));
    print_summary(&aggregation);
    Ok(batch_outcome(&aggregation))
}

fn run_combine(config: &ExtractorConfig, drivers: &[&dyn SourceDriver]) -> Result<Outcome> {
    let aggregation = match gather(config, drivers)? {
        Batch::Ready(aggregation) => aggregation,
        Batch::Stopped(outcome) => return Ok(outcome),
    };

    export_combined(config, &aggregation)?;
    print_summary(&aggregation);
    Ok(batch_outcome(&aggregation))
}

fn run_report<R, W>(
    config: &ExtractorConfig,
    grades: Option<&str>,
    drivers: &[&dyn SourceDriver],
    input: R,
    output: W,
) -> Result<Outcome>
where
    R: BufRead,
    W: Write,
{
    let aggregation = match gather(config, drivers)? {
        Batch::Ready(aggregation) => aggregation,
        Batch::Stopped(outcome) => return Ok(outcome),
    };

    export_combined(config, &aggregation)?;
    print_summary(&aggregation);

    let selection = match grades {
        Some(codes) => parse_selection(codes),
        None => prompt_for_grades(input, output).context("failed to read grade selection")?,
    };
    if !selection.rejected.is_empty() {
        println!("Ignoring unknown grade codes: {}", selection.rejected.join(", "));
    }

    let summaries =
        match write_grade_reports(&aggregation.readings, &selection.grades, &config.report_dir) {
            Ok(summaries) => summaries,
            Err(PipelineError::NoGradeSelected) => {
                println!("No valid grade selected.");
                return Ok(Outcome::NoGradeSelected);
            }
            Err(err) => return Err(err).context("failed to write grade reports"),
        };

    for summary in &summaries {
        println!(
            "{} report saved to: {} ({} rows, {} tanks)",
            summary.grade,
            summary.path.display(),
            summary.rows,
            summary.tanks
        );
        if summary.duplicates > 0 {
            println!(
                "  {} duplicate readings for the same tank and time were dropped",
                summary.duplicates
            );
        }
    }

    Ok(batch_outcome(&aggregation))
}

fn gather(config: &ExtractorConfig, drivers: &[&dyn SourceDriver]) -> Result<Batch> {
    println!("Searching for source files under {}", config.root.display());
    let progress = |file: &FileReport| match &file.message {
        None => println!("Processed {} ({} records)", file.path.display(), file.rows),
        Some(message) => println!("Skipped {}: {message}", file.path.display()),
    };
    let aggregation = match combine_with_progress(
        &config.root,
        &config.extensions,
        &config.table,
        drivers,
        progress,
    ) {
        Ok(aggregation) => aggregation,
        Err(DiscoveryError::RootMissing { path }) => {
            println!("Root directory not found: {}", path.display());
            return Ok(Batch::Stopped(Outcome::NoInputFiles));
        }
        Err(err) => return Err(err).context("failed to search for source files"),
    };

    if aggregation.files_found() == 0 {
        println!("No source files found.");
        return Ok(Batch::Stopped(Outcome::NoInputFiles));
    }
    if aggregation.is_empty() {
        println!("No data found in any source file.");
        return Ok(Batch::Stopped(Outcome::NoData));
    }
    Ok(Batch::Ready(aggregation))
}

fn export_combined(config: &ExtractorConfig, aggregation: &Aggregation) -> Result<()> {
    let path = &config.combined_output;
    let rows = write_combined_export(&aggregation.readings, path)
        .with_context(|| format!("failed to write combined export {}", path.display()))?;
    info!(path = %path.display(), rows, "wrote combined export");
    println!("Combined data saved to: {}", path.display());
    Ok(())
}

fn print_summary(aggregation: &Aggregation) {
    println!("Summary:");
    println!("  Files processed: {}", aggregation.processed_files());
    println!("  Files skipped:   {}", aggregation.failed_files());
    println!("  Total records:   {}", aggregation.total_records());
}

fn batch_outcome(aggregation: &Aggregation) -> Outcome {
    if aggregation.failed_files() > 0 {
        warn!(skipped = aggregation.failed_files(), "some source files were skipped");
        Outcome::PartialFailure
    } else {
        Outcome::Success
    }
}

fn preview_table(readings: &[TankReading], rows: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(READING_COLUMNS.to_vec());

    for reading in readings.iter().take(rows) {
        table.add_row(vec![
            format_timestamp(&reading.timestamp),
            reading.tank_name.clone(),
            reading.product_name.clone().unwrap_or_default(),
            format_decimal(reading.product_temp),
            format_decimal(reading.correction_factor),
            reading.gsv.to_string(),
            format_decimal(reading.product_level),
        ]);
    }
    table
}
