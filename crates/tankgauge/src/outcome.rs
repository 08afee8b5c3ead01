use std::process::ExitCode;

/// How a run ended, as seen by the calling shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The search root is missing or holds no source files.
    NoInputFiles,
    /// Source files were found but none yielded a reading.
    NoData,
    NoGradeSelected,
    /// Output was written but at least one source file was skipped.
    PartialFailure,
}

impl Outcome {
    pub const FAILURE: ExitCode = ExitCode::FAILURE;

    pub fn code(&self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::NoInputFiles => 2,
            Outcome::NoData => 3,
            Outcome::NoGradeSelected => 4,
            Outcome::PartialFailure => 5,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}
