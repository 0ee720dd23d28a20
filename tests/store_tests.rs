//! Tests for the Store façade
//!
//! These tests verify:
//! - Write then reopen and read round trips, bit for bit
//! - Empty datasets
//! - Name uniqueness and failure isolation
//! - Mode enforcement in both directions
//! - Type and rank rejection of foreign records
//! - Session exclusivity through the process-wide registry

use std::fs;
use std::path::{Path, PathBuf};

use arraystore::config::{StoreConfig, SyncStrategy};
use arraystore::container::{registry, ContainerFile, DataType, Shape};
use arraystore::{ErrorCause, Mode, Store, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("results.astr");
    (temp_dir, path)
}

/// Write the given datasets in one session and close it
fn write_datasets(path: &Path, datasets: &[(&str, &str, &[f64])]) {
    let mut store = Store::open(path, Mode::Write).unwrap();
    for (name, unit, values) in datasets {
        store.write(name, unit, values).unwrap();
    }
    store.close().unwrap();
}

/// Write one foreign record directly through the container
fn write_raw_record(path: &Path, name: &str, dtype: DataType, shape: Shape, bytes: &[u8]) {
    let mut container = ContainerFile::create(path, StoreConfig::default()).unwrap();
    let mut record = container.create_record(name, dtype, shape).unwrap();
    record.write(bytes).unwrap();
    record.commit().unwrap();
    container.sync().unwrap();
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_pressure_scenario() {
    let (_temp, path) = setup_temp_file();

    let mut store = Store::open(&path, Mode::Write).unwrap();
    store.write("pressure", "Pa", &[1.0, 2.5, 3.75]).unwrap();
    store.close().unwrap();

    let mut store = Store::open(&path, Mode::Read).unwrap();
    let values = store.read("pressure").unwrap();
    assert_eq!(values, vec![1.0, 2.5, 3.75]);
    assert_eq!(values.len(), 3);

    let result = store.read("temperature");
    assert!(matches!(result, Err(StoreError::NotFound(ref name)) if name == "temperature"));
}

#[test]
fn test_round_trip_is_bit_exact() {
    let (_temp, path) = setup_temp_file();
    let values = [
        0.0,
        -0.0,
        1.0 / 3.0,
        f64::MIN_POSITIVE,
        5e-324, // smallest subnormal
        f64::MAX,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
        -1.234_567_890_123_456_7e-200,
    ];

    write_datasets(&path, &[("edge", "", &values)]);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    let read = store.read("edge").unwrap();

    assert_eq!(read.len(), values.len());
    for (a, b) in values.iter().zip(read.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_multiple_datasets_round_trip() {
    let (_temp, path) = setup_temp_file();
    let density: Vec<f64> = (0..1000).map(|i| i as f64 * 0.5).collect();
    let wind: Vec<f64> = (0..17).map(|i| -(i as f64)).collect();

    write_datasets(
        &path,
        &[
            ("density", "kg/m^3", &density),
            ("wind", "m/s", &wind),
            ("scalar_like", "K", &[273.15]),
        ],
    );

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.dataset_names(), &["density", "wind", "scalar_like"]);

    // Out of write order
    assert_eq!(store.read("wind").unwrap(), wind);
    assert_eq!(store.read("density").unwrap(), density);
    assert_eq!(store.read("scalar_like").unwrap(), vec![273.15]);
}

#[test]
fn test_large_dataset() {
    let (_temp, path) = setup_temp_file();
    let values: Vec<f64> = (0..250_000).map(|i| (i as f64).sqrt()).collect();

    write_datasets(&path, &[("sqrt", "1", &values)]);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(store.read("sqrt").unwrap(), values);
}

#[test]
fn test_read_same_dataset_repeatedly() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("x", "m", &[1.0, 2.0])]);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    for _ in 0..5 {
        assert_eq!(store.read("x").unwrap(), vec![1.0, 2.0]);
    }
}

#[test]
fn test_read_dataset_returns_unit() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("temperature", "K", &[300.0, 301.5]), ("length", "µm", &[1.0])]);

    let mut store = Store::open(&path, Mode::Read).unwrap();

    let dataset = store.read_dataset("temperature").unwrap();
    assert_eq!(dataset.name, "temperature");
    assert_eq!(dataset.unit, "K");
    assert_eq!(dataset.values, vec![300.0, 301.5]);
    assert_eq!(dataset.len(), 2);

    let dataset = store.read_dataset("length").unwrap();
    assert_eq!(dataset.unit, "µm");
}

#[test]
fn test_every_write_sync_strategy() {
    let (_temp, path) = setup_temp_file();
    let config = StoreConfig::builder()
        .sync_strategy(SyncStrategy::EveryWrite)
        .build();

    let mut store = Store::open_with_config(&path, Mode::Write, config).unwrap();
    store.write("a", "s", &[1.0]).unwrap();
    store.write("b", "s", &[2.0]).unwrap();
    drop(store); // implicit close

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(store.read("a").unwrap(), vec![1.0]);
    assert_eq!(store.read("b").unwrap(), vec![2.0]);
}

// =============================================================================
// Empty Dataset Tests
// =============================================================================

#[test]
fn test_empty_dataset_reads_back_empty() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("nothing", "Pa", &[])]);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    let values = store.read("nothing").unwrap();
    assert!(values.is_empty());

    let dataset = store.read_dataset("nothing").unwrap();
    assert!(dataset.is_empty());
    assert_eq!(dataset.unit, "Pa");
}

#[test]
fn test_empty_unit_is_allowed() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("ratio", "", &[0.5])]);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(store.read_dataset("ratio").unwrap().unit, "");
}

// =============================================================================
// Name Uniqueness Tests
// =============================================================================

#[test]
fn test_duplicate_name_fails_and_keeps_first() {
    let (_temp, path) = setup_temp_file();

    let mut store = Store::open(&path, Mode::Write).unwrap();
    store.write("pressure", "Pa", &[1.0, 2.0]).unwrap();

    let result = store.write("pressure", "hPa", &[9.0]);
    match result {
        Err(StoreError::Write { name, source }) => {
            assert_eq!(name, "pressure");
            assert_eq!(source.cause(), ErrorCause::Dataset);
        }
        other => panic!("expected write error, got {:?}", other),
    }
    store.close().unwrap();

    let mut store = Store::open(&path, Mode::Read).unwrap();
    let dataset = store.read_dataset("pressure").unwrap();
    assert_eq!(dataset.values, vec![1.0, 2.0]);
    assert_eq!(dataset.unit, "Pa");
    assert_eq!(store.len(), 1);
}

#[test]
fn test_failed_write_does_not_poison_store() {
    let (_temp, path) = setup_temp_file();

    let mut store = Store::open(&path, Mode::Write).unwrap();
    store.write("a", "m", &[1.0]).unwrap();
    assert!(store.write("a", "m", &[2.0]).is_err());
    assert!(store.write("", "m", &[3.0]).is_err());
    store.write("b", "m", &[4.0]).unwrap();
    store.close().unwrap();

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(store.dataset_names(), &["a", "b"]);
    assert_eq!(store.read("a").unwrap(), vec![1.0]);
    assert_eq!(store.read("b").unwrap(), vec![4.0]);
}

#[test]
fn test_empty_name_is_rejected() {
    let (_temp, path) = setup_temp_file();

    let mut store = Store::open(&path, Mode::Write).unwrap();
    let err = store.write("", "m", &[1.0]).unwrap_err();

    assert!(matches!(err, StoreError::Write { .. }));
    assert_eq!(err.cause(), Some(ErrorCause::Dataset));
    assert!(store.is_empty());
}

// =============================================================================
// Mode Enforcement Tests
// =============================================================================

#[test]
fn test_write_in_read_mode_fails() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("x", "m", &[1.0])]);
    let before = fs::read(&path).unwrap();

    let mut store = Store::open(&path, Mode::Read).unwrap();
    let result = store.write("y", "m", &[2.0]);
    assert!(matches!(
        result,
        Err(StoreError::WrongMode { operation: "write", mode: Mode::Read })
    ));
    assert!(!store.contains("y"));
    drop(store);

    let after = fs::read(&path).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_read_in_write_mode_fails() {
    let (_temp, path) = setup_temp_file();

    let mut store = Store::open(&path, Mode::Write).unwrap();
    store.write("x", "m", &[1.0]).unwrap();

    let result = store.read("x");
    assert!(matches!(
        result,
        Err(StoreError::WrongMode { operation: "read", mode: Mode::Write })
    ));
    assert!(matches!(store.read_dataset("x"), Err(StoreError::WrongMode { .. })));

    // Still writable afterwards
    store.write("y", "m", &[2.0]).unwrap();
    assert_eq!(store.mode(), Mode::Write);
}

#[test]
fn test_write_mode_truncates_existing_file() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("old", "m", &[1.0])]);
    write_datasets(&path, &[("new", "m", &[2.0])]);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert!(!store.contains("old"));
    assert!(matches!(store.read("old"), Err(StoreError::NotFound(_))));
    assert_eq!(store.read("new").unwrap(), vec![2.0]);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_integer_record_is_type_mismatch() {
    let (_temp, path) = setup_temp_file();
    let bytes: Vec<u8> = [1i32, 2, 3].iter().flat_map(|v| v.to_le_bytes()).collect();
    write_raw_record(&path, "counts", DataType::I32Le, Shape::linear(3), &bytes);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    let result = store.read("counts");

    assert!(matches!(
        result,
        Err(StoreError::TypeMismatch { ref name, found: DataType::I32Le }) if name == "counts"
    ));
}

#[test]
fn test_big_endian_f64_is_type_mismatch() {
    let (_temp, path) = setup_temp_file();
    let bytes: Vec<u8> = [1.0f64, 2.0].iter().flat_map(|v| v.to_be_bytes()).collect();
    write_raw_record(&path, "be", DataType::F64Be, Shape::linear(2), &bytes);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert!(matches!(
        store.read("be"),
        Err(StoreError::TypeMismatch { found: DataType::F64Be, .. })
    ));
}

#[test]
fn test_two_dimensional_record_is_shape_mismatch() {
    let (_temp, path) = setup_temp_file();
    let bytes: Vec<u8> = (0..6).flat_map(|i| (i as f64).to_le_bytes()).collect();
    write_raw_record(&path, "grid", DataType::F64Le, Shape::new(vec![2, 3]), &bytes);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert!(matches!(
        store.read("grid"),
        Err(StoreError::ShapeMismatch { ref name, rank: 2 }) if name == "grid"
    ));
}

#[test]
fn test_scalar_record_is_shape_mismatch() {
    let (_temp, path) = setup_temp_file();
    write_raw_record(&path, "g", DataType::F64Le, Shape::scalar(), &9.81f64.to_le_bytes());

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert!(matches!(
        store.read("g"),
        Err(StoreError::ShapeMismatch { rank: 0, .. })
    ));
}

#[test]
fn test_rejection_does_not_affect_other_reads() {
    let (_temp, path) = setup_temp_file();
    {
        let mut container = ContainerFile::create(&path, StoreConfig::default()).unwrap();

        let mut record = container
            .create_record("flags", DataType::U8, Shape::linear(2))
            .unwrap();
        record.write(&[0, 1]).unwrap();
        record.commit().unwrap();

        let mut record = container
            .create_record("good", DataType::F64Le, Shape::linear(2))
            .unwrap();
        record.write_f64(&[4.0, 5.0]).unwrap();
        record.commit().unwrap();
    }

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert!(matches!(store.read("flags"), Err(StoreError::TypeMismatch { .. })));
    assert_eq!(store.read("good").unwrap(), vec![4.0, 5.0]);
}

// =============================================================================
// Describe Tests
// =============================================================================

#[test]
fn test_describe_reports_metadata() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("pressure", "Pa", &[1.0, 2.5, 3.75]), ("empty", "", &[])]);

    let mut store = Store::open(&path, Mode::Read).unwrap();

    let info = store.describe("pressure").unwrap();
    assert_eq!(info.name, "pressure");
    assert_eq!(info.unit, "Pa");
    assert_eq!(info.data_type, DataType::F64Le);
    assert_eq!(info.shape, Shape::linear(3));

    let info = store.describe("empty").unwrap();
    assert_eq!(info.shape, Shape::linear(0));
    assert_eq!(info.unit, "");

    assert!(matches!(store.describe("missing"), Err(StoreError::NotFound(_))));
}

#[test]
fn test_describe_accepts_foreign_records() {
    let (_temp, path) = setup_temp_file();
    let bytes: Vec<u8> = (0..6).flat_map(|i| (i as f64).to_le_bytes()).collect();
    write_raw_record(&path, "grid", DataType::F64Le, Shape::new(vec![2, 3]), &bytes);

    let mut store = Store::open(&path, Mode::Read).unwrap();
    let info = store.describe("grid").unwrap();

    assert_eq!(info.shape.dims(), &[2, 3]);
    assert_eq!(info.unit, ""); // no units attribute
    assert!(matches!(store.read("grid"), Err(StoreError::ShapeMismatch { .. })));
}

#[test]
fn test_describe_in_write_mode_fails() {
    let (_temp, path) = setup_temp_file();

    let mut store = Store::open(&path, Mode::Write).unwrap();
    store.write("x", "m", &[1.0]).unwrap();

    assert!(matches!(
        store.describe("x"),
        Err(StoreError::WrongMode { operation: "describe", mode: Mode::Write })
    ));
}

// =============================================================================
// Open / Session Tests
// =============================================================================

#[test]
fn test_open_missing_file_for_read_fails() {
    let (_temp, path) = setup_temp_file();

    let err = Store::open(&path, Mode::Read).unwrap_err();

    assert!(matches!(err, StoreError::Open { .. }));
    assert_eq!(err.cause(), Some(ErrorCause::File));
}

#[test]
fn test_open_in_missing_directory_for_write_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("no_such_dir").join("out.astr");

    let err = Store::open(&path, Mode::Write).unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }));
}

#[test]
fn test_open_non_container_fails() {
    let (_temp, path) = setup_temp_file();
    fs::write(&path, b"GARBAGE_DATA_NOT_A_CONTAINER").unwrap();

    let err = Store::open(&path, Mode::Read).unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }));
    assert_eq!(err.cause(), Some(ErrorCause::File));
}

#[test]
fn test_second_writer_is_rejected() {
    let (_temp, path) = setup_temp_file();

    let mut first = Store::open(&path, Mode::Write).unwrap();
    let second = Store::open(&path, Mode::Write);
    assert!(matches!(second, Err(StoreError::Open { .. })));

    // The rejected open must not have truncated the first session's file
    first.write("x", "m", &[1.0]).unwrap();
    first.close().unwrap();

    let mut store = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(store.read("x").unwrap(), vec![1.0]);
}

#[test]
fn test_readers_share_but_exclude_writer() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("x", "m", &[1.0])]);

    let mut a = Store::open(&path, Mode::Read).unwrap();
    let mut b = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(a.read("x").unwrap(), b.read("x").unwrap());

    assert!(matches!(
        Store::open(&path, Mode::Write),
        Err(StoreError::Open { .. })
    ));

    drop(a);
    assert!(Store::open(&path, Mode::Write).is_err());
    drop(b);

    let store = Store::open(&path, Mode::Write).unwrap();
    drop(store);
}

#[test]
fn test_session_released_on_drop() {
    let (_temp, path) = setup_temp_file();

    let store = Store::open(&path, Mode::Write).unwrap();
    assert!(registry::is_open(&path));
    drop(store);
    assert!(!registry::is_open(&path));

    // Failed opens leave nothing registered either
    fs::write(&path, b"nope").unwrap();
    assert!(Store::open(&path, Mode::Read).is_err());
    assert!(!registry::is_open(&path));
}

#[test]
fn test_explicit_close_of_read_session() {
    let (_temp, path) = setup_temp_file();
    write_datasets(&path, &[("x", "m", &[1.0])]);

    let store = Store::open(&path, Mode::Read).unwrap();
    assert_eq!(store.path(), path.as_path());
    store.close().unwrap();
    assert!(!registry::is_open(&path));
}
