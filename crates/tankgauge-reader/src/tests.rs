use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::ReaderError;
use crate::mdbtools::{parse_export, parse_table_list};
use crate::memory::MemoryDriver;
use crate::model::{RawTable, READING_COLUMNS};
use crate::normalize::{quantize_timestamp, readings_from_table, round_temperature, truncate_gsv};
use crate::registry::{list_tables_with_drivers, read_with_drivers};
use crate::source::{read_readings, SourceDriver};

fn fixture(path: &str) -> Vec<u8> {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn export_table() -> RawTable {
    parse_export("TankRecords", &fixture("tank_records_export.csv")).expect("export parse failed")
}

#[test]
fn parses_mdb_export_output() {
    let raw = export_table();

    assert_eq!(raw.table, "TankRecords");
    assert_eq!(raw.headers.len(), 9);
    assert_eq!(raw.headers[1], "BACKGROUND_TIME_STAMP");
    assert_eq!(raw.height(), 4);
    assert_eq!(raw.rows[2][4], "");
}

#[test]
fn parses_mdb_tables_listing() {
    let tables = parse_table_list(&fixture("table_list.txt"));
    assert_eq!(tables, vec!["TankRecords", "MSysNavPaneGroups", "AlarmLog"]);
}

#[test]
fn projection_reorders_and_drops_extra_columns() {
    let projected = export_table().project(&READING_COLUMNS).expect("projection failed");

    assert_eq!(projected.headers, READING_COLUMNS);
    assert_eq!(projected.rows[0][1], "TK-02");
    assert_eq!(projected.rows[0].len(), READING_COLUMNS.len());
}

#[test]
fn projection_reports_missing_column() {
    let raw = RawTable::new(
        "TankRecords",
        vec!["BACKGROUND_TIME_STAMP".into(), "TANK_NAME".into()],
        Vec::new(),
    );

    let err = raw.project(&READING_COLUMNS).unwrap_err();
    match err {
        ReaderError::MissingColumn { table, column } => {
            assert_eq!(table, "TankRecords");
            assert_eq!(column, "PRODUCT_NAME");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn normalizes_fixture_rows() {
    let readings = readings_from_table(&export_table()).expect("normalize failed");
    assert_eq!(readings.len(), 4);

    let first = &readings[0];
    assert_eq!(first.timestamp, ts(6, 0, 0));
    assert_eq!(first.tank_name, "TK-02");
    assert_eq!(first.product_name.as_deref(), Some("ULP 95"));
    assert_eq!(first.product_temp, Some(21.46));
    assert_eq!(first.correction_factor, Some(0.99812));
    assert_eq!(first.gsv, 152_340);
    assert_eq!(first.product_level, Some(8123.5));

    assert_eq!(readings[1].timestamp, ts(6, 2, 0));
    assert_eq!(readings[1].product_temp, Some(19.0));

    let kero = &readings[2];
    assert_eq!(kero.timestamp, ts(6, 4, 0));
    assert_eq!(kero.product_temp, None);
    assert_eq!(kero.product_level, None);
    assert_eq!(kero.gsv, 45_012);

    assert_eq!(readings[3].timestamp, ts(6, 2, 0));
    assert_eq!(readings[3].product_temp, Some(19.12));
}

#[test]
fn timestamp_rounds_to_nearest_two_minutes_with_ties_to_even() {
    assert_eq!(quantize_timestamp(ts(6, 0, 59)), ts(6, 0, 0));
    assert_eq!(quantize_timestamp(ts(6, 1, 1)), ts(6, 2, 0));
    // 06:01:00 sits between bucket 06:00 (even) and 06:02 (odd)
    assert_eq!(quantize_timestamp(ts(6, 1, 0)), ts(6, 0, 0));
    // 06:03:00 sits between 06:02 (odd) and 06:04 (even)
    assert_eq!(quantize_timestamp(ts(6, 3, 0)), ts(6, 4, 0));
    assert_eq!(quantize_timestamp(ts(23, 59, 30)), ts(0, 0, 0) + chrono::Duration::days(1));
}

#[test]
fn temperature_rounding_matches_half_even() {
    assert_eq!(round_temperature(21.454), 21.45);
    assert_eq!(round_temperature(21.456), 21.46);
    assert_eq!(round_temperature(0.125), 0.12);
    assert_eq!(round_temperature(-3.333), -3.33);
}

#[test]
fn gsv_is_truncated_not_rounded() {
    assert_eq!(truncate_gsv(98231.99), Some(98231));
    assert_eq!(truncate_gsv(-3.7), Some(-3));
    assert_eq!(truncate_gsv(f64::NAN), None);
}

#[test]
fn missing_gsv_is_a_row_error() {
    let raw = RawTable::new(
        "TankRecords",
        READING_COLUMNS.iter().map(|c| c.to_string()).collect(),
        vec![vec![
            "2024-03-01 06:00:00".into(),
            "TK-01".into(),
            "ULP".into(),
            "20.0".into(),
            "1.0".into(),
            "".into(),
            "100".into(),
        ]],
    );

    let err = readings_from_table(&raw).unwrap_err();
    assert!(matches!(err, ReaderError::DataRow { row_index: 0, .. }));
}

#[test]
fn read_readings_requires_existing_file() {
    let driver = MemoryDriver::new();
    let err = read_readings(&driver, &PathBuf::from("/nonexistent/site.mdb"), "TankRecords")
        .unwrap_err();
    assert!(matches!(err, ReaderError::MissingFile { .. }));
}

#[test]
fn select_lists_available_tables_when_table_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.mdb");
    fs::write(&path, b"").unwrap();

    let driver = MemoryDriver::new().with_table(
        &path,
        RawTable::new("AlarmLog", vec!["ID".into()], Vec::new()),
    );

    let err = read_readings(&driver, &path, "TankRecords").unwrap_err();
    match err {
        ReaderError::TableNotFound { table, available } => {
            assert_eq!(table, "TankRecords");
            assert_eq!(available, vec!["AlarmLog".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn registry_falls_through_unavailable_drivers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.mdb");
    fs::write(&path, b"").unwrap();

    let missing = MemoryDriver::unavailable();
    let loaded = MemoryDriver::new().with_table(&path, export_table());
    let drivers: [&dyn SourceDriver; 2] = [&missing, &loaded];

    let readings = read_with_drivers(&path, "TankRecords", &drivers).expect("read failed");
    assert_eq!(readings.len(), 4);

    let tables = list_tables_with_drivers(&path, &drivers).expect("listing failed");
    assert_eq!(tables, vec!["TankRecords".to_string()]);
}

#[test]
fn registry_reports_every_unavailable_driver() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.mdb");
    fs::write(&path, b"").unwrap();

    let first = MemoryDriver::unavailable();
    let second = MemoryDriver::unavailable();
    let drivers: [&dyn SourceDriver; 2] = [&first, &second];

    match read_with_drivers(&path, "TankRecords", &drivers).unwrap_err() {
        ReaderError::NoUsableDriver { attempts } => assert_eq!(attempts.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
mod mdbtools_process {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;

    use super::ts;
    use crate::errors::ReaderError;
    use crate::mdbtools::MdbToolsDriver;
    use crate::registry::read_with_drivers;
    use crate::source::{read_readings, SourceDriver};

    fn write_script(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn source_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("site.mdb");
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn reads_readings_through_mdb_tools_programs() {
        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), "mdb-tables", "printf 'AlarmLog\\nTankRecords\\n'");
        write_script(
            bin.path(),
            "mdb-export",
            r#"[ "$1" = "-D" ] && [ "$3" = "-T" ] && [ "$6" = "TankRecords" ] || exit 3
cat <<'CSV'
BACKGROUND_TIME_STAMP,TANK_NAME,PRODUCT_NAME,PRODUCT_TEMP,CORRECTION_FACTOR,GSV,PRODUCT_LEVEL
2024-03-01 06:00:50,TK1,ULP 91,21.456,0.9981,100.9,4200.5
CSV"#,
        );
        let data = tempfile::tempdir().unwrap();
        let path = source_file(data.path());

        let driver = MdbToolsDriver::new().with_bin_dir(bin.path());
        let readings = read_readings(&driver, &path, "TankRecords").expect("mdbtools read failed");

        assert_eq!(readings.len(), 1);
        let reading = &readings[0];
        assert_eq!(reading.timestamp, ts(6, 0, 0));
        assert_eq!(reading.tank_name, "TK1");
        assert_eq!(reading.product_name.as_deref(), Some("ULP 91"));
        assert_eq!(reading.product_temp, Some(21.46));
        assert_eq!(reading.gsv, 100);
        assert_eq!(reading.product_level, Some(4200.5));
    }

    #[test]
    fn failing_export_is_a_driver_error() {
        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), "mdb-tables", "echo TankRecords");
        write_script(bin.path(), "mdb-export", "echo 'corrupt file' >&2; exit 1");
        let data = tempfile::tempdir().unwrap();
        let path = source_file(data.path());

        let driver = MdbToolsDriver::new().with_bin_dir(bin.path());
        match read_readings(&driver, &path, "TankRecords").unwrap_err() {
            ReaderError::Driver { message, .. } => assert!(message.contains("corrupt file")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn slow_table_listing_times_out() {
        let bin = tempfile::tempdir().unwrap();
        write_script(bin.path(), "mdb-tables", "exec sleep 5");
        let data = tempfile::tempdir().unwrap();
        let path = source_file(data.path());

        let driver = MdbToolsDriver::new()
            .with_bin_dir(bin.path())
            .with_connect_timeout(Duration::from_millis(200));
        match driver.open(&path).err().expect("open should time out") {
            ReaderError::Driver { driver, message, .. } => {
                assert_eq!(driver, "mdbtools");
                assert!(message.contains("timed out"), "message: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_programs_leave_no_usable_driver() {
        let bin = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let path = source_file(data.path());

        let driver = MdbToolsDriver::new().with_bin_dir(bin.path().join("absent"));
        let drivers: [&dyn SourceDriver; 1] = [&driver];

        match read_with_drivers(&path, "TankRecords", &drivers).unwrap_err() {
            ReaderError::NoUsableDriver { attempts } => {
                assert_eq!(attempts.len(), 1);
                assert_eq!(attempts[0].driver, "mdbtools");
                assert!(attempts[0].message.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
