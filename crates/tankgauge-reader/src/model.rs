use std::fmt;

use chrono::NaiveDateTime;

use crate::errors::ReaderError;

/// Source column names of the tank-gauging table, in export order.
pub const READING_COLUMNS: [&str; 7] = [
    "BACKGROUND_TIME_STAMP",
    "TANK_NAME",
    "PRODUCT_NAME",
    "PRODUCT_TEMP",
    "CORRECTION_FACTOR",
    "GSV",
    "PRODUCT_LEVEL",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingColumn {
    Timestamp,
    TankName,
    ProductName,
    ProductTemp,
    CorrectionFactor,
    Gsv,
    ProductLevel,
}

impl ReadingColumn {
    pub const ALL: [ReadingColumn; 7] = [
        ReadingColumn::Timestamp,
        ReadingColumn::TankName,
        ReadingColumn::ProductName,
        ReadingColumn::ProductTemp,
        ReadingColumn::CorrectionFactor,
        ReadingColumn::Gsv,
        ReadingColumn::ProductLevel,
    ];

    pub fn source_name(&self) -> &'static str {
        match self {
            ReadingColumn::Timestamp => "BACKGROUND_TIME_STAMP",
            ReadingColumn::TankName => "TANK_NAME",
            ReadingColumn::ProductName => "PRODUCT_NAME",
            ReadingColumn::ProductTemp => "PRODUCT_TEMP",
            ReadingColumn::CorrectionFactor => "CORRECTION_FACTOR",
            ReadingColumn::Gsv => "GSV",
            ReadingColumn::ProductLevel => "PRODUCT_LEVEL",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ReadingColumn::Timestamp => 0,
            ReadingColumn::TankName => 1,
            ReadingColumn::ProductName => 2,
            ReadingColumn::ProductTemp => 3,
            ReadingColumn::CorrectionFactor => 4,
            ReadingColumn::Gsv => 5,
            ReadingColumn::ProductLevel => 6,
        }
    }
}

impl fmt::Display for ReadingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// One normalized gauge measurement.
///
/// The timestamp is already quantized to the two-minute grid, the temperature
/// rounded to two decimals and the GSV truncated to a whole number.
#[derive(Debug, Clone, PartialEq)]
pub struct TankReading {
    pub timestamp: NaiveDateTime,
    pub tank_name: String,
    pub product_name: Option<String>,
    pub product_temp: Option<f64>,
    pub correction_factor: Option<f64>,
    pub gsv: i64,
    pub product_level: Option<f64>,
}

impl TankReading {
    /// Case-insensitive substring match of the product name. Readings without a
    /// product name never match.
    pub fn product_matches(&self, pattern_upper: &str) -> bool {
        self.product_name
            .as_deref()
            .map(|name| name.to_uppercase().contains(pattern_upper))
            .unwrap_or(false)
    }
}

/// Text cells of one table exactly as a driver produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub table: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(table: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            table: table.into(),
            headers,
            rows,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Returns a table holding only `columns`, in that order. Header lookup
    /// ignores ASCII case.
    pub fn project(&self, columns: &[&str]) -> Result<RawTable, ReaderError> {
        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let idx = self
                .headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(column))
                .ok_or_else(|| ReaderError::MissingColumn {
                    table: self.table.clone(),
                    column: column.to_string(),
                })?;
            indices.push(idx);
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(RawTable {
            table: self.table.clone(),
            headers: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }
}
