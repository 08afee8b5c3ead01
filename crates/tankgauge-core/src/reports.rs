use std::path::{Path, PathBuf};

use tankgauge_reader::TankReading;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::grades::Grade;
use crate::outputs::write_wide_report;
use crate::pivot::pivot;

#[derive(Debug, Clone, PartialEq)]
pub struct GradeReportSummary {
    pub grade: Grade,
    pub path: PathBuf,
    pub rows: usize,
    pub tanks: usize,
    pub matched_readings: usize,
    pub duplicates: usize,
}

/// Pivots and writes one wide report per grade into `report_dir`. A grade that
/// matches nothing still gets a header-only file.
pub fn write_grade_reports(
    readings: &[TankReading],
    grades: &[Grade],
    report_dir: &Path,
) -> Result<Vec<GradeReportSummary>> {
    if grades.is_empty() {
        return Err(PipelineError::NoGradeSelected);
    }

    let mut summaries = Vec::with_capacity(grades.len());
    for &grade in grades {
        info!(grade = %grade, "extracting grade report");
        let report = pivot(readings, &grade.filter());
        let path = report_dir.join(grade.report_file_name());
        write_wide_report(&report, &path)?;
        info!(
            grade = %grade,
            path = %path.display(),
            rows = report.rows.len(),
            tanks = report.tank_order.len(),
            "wrote grade report"
        );

        summaries.push(GradeReportSummary {
            grade,
            path,
            rows: report.rows.len(),
            tanks: report.tank_order.len(),
            matched_readings: report.matched_readings,
            duplicates: report.duplicates,
        });
    }

    Ok(summaries)
}
