use std::cell::Cell;
use std::fs;
use std::path::Path;

use tankgauge_core::aggregate::{combine, combine_with_progress, FileStatus};
use tankgauge_core::discovery::DiscoveryError;
use tankgauge_reader::{
    MemoryDriver, RawTable, ReaderError, SourceConnection, SourceDriver, READING_COLUMNS,
};

/// Counts how many files have been opened so far.
struct CountingDriver {
    inner: MemoryDriver,
    opens: Cell<usize>,
}

impl SourceDriver for CountingDriver {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn SourceConnection>, ReaderError> {
        self.opens.set(self.opens.get() + 1);
        self.inner.open(path)
    }
}

fn tank_table(rows: &[(&str, &str, &str, &str)]) -> RawTable {
    RawTable::new(
        "TankRecords",
        READING_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|(ts, tank, product, gsv)| {
                vec![
                    ts.to_string(),
                    tank.to_string(),
                    product.to_string(),
                    "18.255".to_string(),
                    "0.9981".to_string(),
                    gsv.to_string(),
                    "5000.5".to_string(),
                ]
            })
            .collect(),
    )
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

#[test]
fn skips_file_without_tank_table_and_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("site_a").join("jan.mdb");
    let second = dir.path().join("site_a").join("feb.mdb");
    let broken = dir.path().join("site_b").join("mar.mdb");
    for path in [&first, &second, &broken] {
        touch(path);
    }

    let driver = MemoryDriver::new()
        .with_table(
            &first,
            tank_table(&[
                ("2024-01-31 23:58:10", "TK1", "ULP", "1000.9"),
                ("2024-01-31 23:58:10", "TK2", "DIESEL", "2000.1"),
            ]),
        )
        .with_table(
            &second,
            tank_table(&[("2024-02-29 12:00:00", "TK1", "ULP", "999")]),
        )
        .with_table(&broken, RawTable::new("AlarmLog", vec!["ID".into()], Vec::new()));
    let drivers: [&dyn SourceDriver; 1] = [&driver];

    let aggregation = combine(dir.path(), &["mdb".to_string()], "TankRecords", &drivers)
        .expect("combine failed");

    assert_eq!(aggregation.files_found(), 3);
    assert_eq!(aggregation.processed_files(), 2);
    assert_eq!(aggregation.failed_files(), 1);
    assert_eq!(aggregation.total_records(), 3);

    let failed = aggregation
        .reports
        .iter()
        .find(|r| r.status == FileStatus::Failed)
        .unwrap();
    assert_eq!(failed.path, broken);
    assert!(failed.message.as_deref().unwrap().contains("TankRecords"));

    // sorted discovery: site_a/feb.mdb before site_a/jan.mdb
    assert_eq!(aggregation.readings[0].gsv, 999);
    assert_eq!(aggregation.readings[1].gsv, 1000);
    assert_eq!(aggregation.readings[2].gsv, 2000);
}

#[test]
fn no_usable_file_yields_empty_aggregation() {
    let dir = tempfile::tempdir().unwrap();
    let only = dir.path().join("empty.mdb");
    touch(&only);

    let driver = MemoryDriver::new();
    let drivers: [&dyn SourceDriver; 1] = [&driver];

    let aggregation = combine(dir.path(), &["mdb".to_string()], "TankRecords", &drivers)
        .expect("combine failed");

    assert!(aggregation.is_empty());
    assert_eq!(aggregation.failed_files(), 1);
}

#[test]
fn missing_root_stops_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let driver = MemoryDriver::new();
    let drivers: [&dyn SourceDriver; 1] = [&driver];

    let err = combine(
        &dir.path().join("nope"),
        &["mdb".to_string()],
        "TankRecords",
        &drivers,
    )
    .unwrap_err();
    assert!(matches!(err, DiscoveryError::RootMissing { .. }));
}

#[test]
fn corrupt_row_skips_only_that_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("a.mdb");
    let bad = dir.path().join("b.mdb");
    touch(&good);
    touch(&bad);

    let driver = MemoryDriver::new()
        .with_table(&good, tank_table(&[("2024-01-01 00:00:00", "TK1", "KERO", "5")]))
        .with_table(&bad, tank_table(&[("not a date", "TK1", "KERO", "5")]));
    let drivers: [&dyn SourceDriver; 1] = [&driver];

    let aggregation = combine(dir.path(), &["mdb".to_string()], "TankRecords", &drivers)
        .expect("combine failed");

    assert_eq!(aggregation.processed_files(), 1);
    assert_eq!(aggregation.failed_files(), 1);
    assert_eq!(aggregation.total_records(), 1);
}

#[test]
fn progress_is_reported_before_the_next_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.mdb");
    let second = dir.path().join("b.mdb");
    touch(&first);
    touch(&second);

    let driver = CountingDriver {
        inner: MemoryDriver::new().with_table(
            &first,
            tank_table(&[("2024-03-01 06:00:00", "TK1", "ULP", "10")]),
        ),
        opens: Cell::new(0),
    };
    let drivers: [&dyn SourceDriver; 1] = [&driver];

    let mut seen = Vec::new();
    let aggregation = combine_with_progress(
        dir.path(),
        &["mdb".to_string()],
        "TankRecords",
        &drivers,
        |report| seen.push((report.path.clone(), report.status, driver.opens.get())),
    )
    .expect("combine failed");

    assert_eq!(
        seen,
        vec![
            (first, FileStatus::Parsed, 1),
            (second, FileStatus::Failed, 2),
        ]
    );
    assert_eq!(aggregation.total_records(), 1);
}
