//! Tests for the arraystore-inspect binary
//!
//! These tests verify:
//! - `list` prints metadata for every dataset, foreign records included
//! - `show` and `dump` print values
//! - Failures exit with status 1

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use arraystore::config::StoreConfig;
use arraystore::container::{ContainerFile, DataType, Shape};
use arraystore::{Mode, Store};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("results.astr");
    (temp_dir, path)
}

fn inspect(path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_arraystore-inspect"))
        .arg(path)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_list_prints_metadata() {
    let (_temp, path) = setup_temp_file();
    {
        let mut store = Store::open(&path, Mode::Write).unwrap();
        store.write("pressure", "Pa", &[1.0, 2.5, 3.75]).unwrap();
        store.write("empty", "", &[]).unwrap();
        store.close().unwrap();
    }

    let output = inspect(&path, &["list"]);
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["pressure\tPa\tf64le\t3", "empty\t\tf64le\t0"]
    );
}

#[test]
fn test_list_includes_foreign_records() {
    let (_temp, path) = setup_temp_file();
    {
        let mut container = ContainerFile::create(&path, StoreConfig::default()).unwrap();
        let mut record = container
            .create_record("grid", DataType::U8, Shape::new(vec![2, 3]))
            .unwrap();
        record.write(&[0; 6]).unwrap();
        record.commit().unwrap();
        container.sync().unwrap();
    }

    let output = inspect(&path, &["list"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["grid\t\tu8\t2x3"]);
}

#[test]
fn test_show_and_dump() {
    let (_temp, path) = setup_temp_file();
    {
        let mut store = Store::open(&path, Mode::Write).unwrap();
        store.write("t", "K", &[1.0, 3.0, 0.1]).unwrap();
        store.close().unwrap();
    }

    let output = inspect(&path, &["show", "t"]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "name:   t");
    assert_eq!(lines[1], "units:  K");
    assert_eq!(lines[2], "length: 3");
    assert_eq!(lines[3], "min:    0.1");
    assert_eq!(lines[4], "max:    3");

    let output = inspect(&path, &["dump", "t"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["1.0", "3.0", "0.1"]);
}

#[test]
fn test_missing_dataset_exits_with_failure() {
    let (_temp, path) = setup_temp_file();
    {
        let mut store = Store::open(&path, Mode::Write).unwrap();
        store.write("t", "K", &[1.0]).unwrap();
        store.close().unwrap();
    }

    let output = inspect(&path, &["dump", "missing"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_file_exits_with_failure() {
    let (_temp, path) = setup_temp_file();

    let output = inspect(&path, &["list"]);
    assert_eq!(output.status.code(), Some(1));
}
