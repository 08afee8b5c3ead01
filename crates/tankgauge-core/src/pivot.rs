use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use tankgauge_reader::{ReadingColumn, TankReading};
use tracing::{debug, warn};

use crate::grades::GradeFilter;

/// Per-tank columns repeated once per tank in a wide report.
pub const TANK_BLOCK_COLUMNS: [ReadingColumn; 6] = [
    ReadingColumn::TankName,
    ReadingColumn::ProductName,
    ReadingColumn::ProductTemp,
    ReadingColumn::CorrectionFactor,
    ReadingColumn::Gsv,
    ReadingColumn::ProductLevel,
];

/// One tank's slice of a wide row. The tank name is always present; the
/// measurements are `None` when the tank did not report at that timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TankBlock {
    pub tank_name: String,
    pub product_name: Option<String>,
    pub product_temp: Option<f64>,
    pub correction_factor: Option<f64>,
    pub gsv: Option<i64>,
    pub product_level: Option<f64>,
}

impl TankBlock {
    fn from_reading(reading: &TankReading) -> Self {
        Self {
            tank_name: reading.tank_name.clone(),
            product_name: reading.product_name.clone(),
            product_temp: reading.product_temp,
            correction_factor: reading.correction_factor,
            gsv: Some(reading.gsv),
            product_level: reading.product_level,
        }
    }

    fn placeholder(tank_name: &str) -> Self {
        Self {
            tank_name: tank_name.to_string(),
            product_name: None,
            product_temp: None,
            correction_factor: None,
            gsv: None,
            product_level: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.product_name.is_none()
            && self.product_temp.is_none()
            && self.correction_factor.is_none()
            && self.gsv.is_none()
            && self.product_level.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub timestamp: NaiveDateTime,
    pub blocks: Vec<TankBlock>,
}

/// Wide-format view of one grade: a row per distinct timestamp and a fixed
/// block of columns per tank, in `tank_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct WideReport {
    pub grade: String,
    pub tank_order: Vec<String>,
    pub rows: Vec<WideRow>,
    /// Readings that passed the grade filter.
    pub matched_readings: usize,
    /// Readings dropped because an earlier reading had the same timestamp and tank.
    pub duplicates: usize,
}

impl WideReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        1 + self.tank_order.len() * TANK_BLOCK_COLUMNS.len()
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = Vec::with_capacity(self.column_count());
        header.push(ReadingColumn::Timestamp.source_name());
        for _ in &self.tank_order {
            header.extend(TANK_BLOCK_COLUMNS.iter().map(|c| c.source_name()));
        }
        header
    }
}

/// Pivots long-format readings into the wide report for one grade.
///
/// Tanks are ordered by name and that order is fixed for every row. A tank
/// without a reading at a timestamp gets a placeholder block. When the same
/// (timestamp, tank) pair appears more than once, the first reading in input
/// order is kept and the rest are counted in [`WideReport::duplicates`].
pub fn pivot(readings: &[TankReading], filter: &GradeFilter) -> WideReport {
    let mut tanks: BTreeSet<&str> = BTreeSet::new();
    let mut by_slot: BTreeMap<(NaiveDateTime, &str), &TankReading> = BTreeMap::new();
    let mut matched_readings = 0;
    let mut duplicates = 0;

    for reading in readings.iter().filter(|r| filter.matches(r)) {
        matched_readings += 1;
        tanks.insert(reading.tank_name.as_str());
        match by_slot.entry((reading.timestamp, reading.tank_name.as_str())) {
            Entry::Vacant(slot) => {
                slot.insert(reading);
            }
            Entry::Occupied(_) => duplicates += 1,
        }
    }

    let tank_order: Vec<String> = tanks.iter().map(|t| t.to_string()).collect();
    let timestamps: BTreeSet<NaiveDateTime> = by_slot.keys().map(|(ts, _)| *ts).collect();

    let rows: Vec<WideRow> = timestamps
        .into_iter()
        .map(|timestamp| {
            let blocks = tanks
                .iter()
                .map(|tank| match by_slot.get(&(timestamp, *tank)) {
                    Some(reading) => TankBlock::from_reading(reading),
                    None => TankBlock::placeholder(tank),
                })
                .collect();
            WideRow { timestamp, blocks }
        })
        .collect();

    if duplicates > 0 {
        warn!(
            grade = filter.pattern(),
            duplicates, "kept first reading for repeated timestamp/tank pairs"
        );
    }
    debug!(
        grade = filter.pattern(),
        rows = rows.len(),
        tanks = tank_order.len(),
        matched = matched_readings,
        "pivoted grade"
    );

    WideReport {
        grade: filter.pattern().to_string(),
        tank_order,
        rows,
        matched_readings,
        duplicates,
    }
}
