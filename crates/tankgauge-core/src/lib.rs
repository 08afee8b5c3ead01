pub mod aggregate;
pub mod config;
pub mod discovery;
pub mod error;
pub mod grades;
pub mod outputs;
pub mod pivot;
pub mod reports;

pub use aggregate::{
    combine, combine_files, combine_files_with_progress, combine_with_progress, Aggregation,
    FileReport, FileStatus,
};
pub use config::ExtractorConfig;
pub use discovery::{discover_source_files, DiscoveryError};
pub use error::{PipelineError, Result};
pub use grades::{parse_selection, Grade, GradeFilter, GradeSelection};
pub use pivot::{pivot, TankBlock, WideReport, WideRow};
pub use reports::{write_grade_reports, GradeReportSummary};
