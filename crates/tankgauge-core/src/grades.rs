use std::fmt;

use tankgauge_reader::TankReading;
use tracing::warn;

/// Fuel grades the extractor knows how to report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    Diesel,
    Ulp,
    Kero,
    JetA1,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Diesel, Grade::Ulp, Grade::Kero, Grade::JetA1];

    /// Menu code selecting every grade.
    pub const ALL_CODE: &'static str = "5";

    pub fn code(&self) -> &'static str {
        match self {
            Grade::Diesel => "1",
            Grade::Ulp => "2",
            Grade::Kero => "3",
            Grade::JetA1 => "4",
        }
    }

    /// Product-name fragment matched against readings; also names the report.
    pub fn pattern(&self) -> &'static str {
        match self {
            Grade::Diesel => "DIESEL",
            Grade::Ulp => "ULP",
            Grade::Kero => "KERO",
            Grade::JetA1 => "JET A1",
        }
    }

    pub fn menu_label(&self) -> &'static str {
        match self {
            Grade::Diesel => "D50",
            Grade::Ulp => "ULP",
            Grade::Kero => "KERO",
            Grade::JetA1 => "JET A1",
        }
    }

    pub fn filter(&self) -> GradeFilter {
        GradeFilter::new(self.pattern())
    }

    pub fn report_file_name(&self) -> String {
        format!("{} Grade_report.csv", self.pattern())
    }

    pub fn from_code(code: &str) -> Option<Grade> {
        Grade::ALL.into_iter().find(|grade| grade.code() == code)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Case-insensitive substring filter over product names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeFilter {
    pattern: String,
    pattern_upper: String,
}

impl GradeFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let pattern_upper = pattern.to_uppercase();
        Self {
            pattern,
            pattern_upper,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, reading: &TankReading) -> bool {
        reading.product_matches(&self.pattern_upper)
    }
}

/// Resolved answer to the grade prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeSelection {
    pub grades: Vec<Grade>,
    pub rejected: Vec<String>,
}

impl GradeSelection {
    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }
}

/// Parses comma-separated menu codes. Unknown codes are dropped, the all-grades
/// code expands to every grade, and repeats collapse to their first position.
pub fn parse_selection(input: &str) -> GradeSelection {
    let mut selection = GradeSelection::default();

    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let resolved: Vec<Grade> = if token == Grade::ALL_CODE {
            Grade::ALL.to_vec()
        } else if let Some(grade) = Grade::from_code(token) {
            vec![grade]
        } else {
            warn!(code = token, "ignoring unknown grade code");
            selection.rejected.push(token.to_string());
            continue;
        };

        for grade in resolved {
            if !selection.grades.contains(&grade) {
                selection.grades.push(grade);
            }
        }
    }

    selection
}

/// Menu text shown before the interactive prompt.
pub fn selection_menu() -> String {
    let mut menu = String::from("Select grade(s) to extract:\n");
    for grade in Grade::ALL {
        menu.push_str(&format!("{} - {}\n", grade.code(), grade.menu_label()));
    }
    menu.push_str(&format!("{} - All Grades\n", Grade::ALL_CODE));
    menu.push_str("You can select multiple grades (comma separated), e.g. 1,2\n");
    menu
}
