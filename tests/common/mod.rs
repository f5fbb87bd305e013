//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sdarc::{
    Archive, ArchiveConfig, CellArray, CharArray, Complex, FileContainer, FormatVersion,
    LogicalArray, MemoryContainer, NumericArray, OpenMode, SparseMatrix, StructValue, Value,
};
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    });
}

/// Fixed time used for `Updated` assertions.
pub fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2031, 3, 4)
        .and_then(|d| d.and_hms_opt(5, 6, 7))
        .expect("valid fixed time")
}

/// Fresh in-memory archive at `version`.
pub fn memory_archive(version: FormatVersion) -> Archive<MemoryContainer> {
    init_tracing();
    Archive::create_with_version(MemoryContainer::new(), version, ArchiveConfig::default())
        .expect("create archive")
}

// ============================================================================
// TestArchive - file-backed archive in a temp directory
// ============================================================================

/// File-backed archive that keeps its directory alive.
pub struct TestArchive {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestArchive {
    /// Create a new archive file at the latest version.
    pub fn new() -> Self {
        init_tracing();
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("test.sda");
        Archive::open_file(&path, OpenMode::CreateNew, ArchiveConfig::default())
            .expect("create archive file")
            .close()
            .expect("close archive");
        TestArchive { dir, path }
    }

    /// Open the archive with `mode`.
    pub fn open(&self, mode: OpenMode) -> Archive<FileContainer> {
        Archive::open_file(&self.path, mode, ArchiveConfig::default()).expect("open archive")
    }

    /// Open the archive read-write.
    pub fn writer(&self) -> Archive<FileContainer> {
        self.open(OpenMode::ReadWrite)
    }

    /// Open the archive read-only.
    pub fn reader(&self) -> Archive<FileContainer> {
        self.open(OpenMode::ReadOnly)
    }
}

// ============================================================================
// Sample values
// ============================================================================

/// One value of every storable kind, with labels valid in every version.
pub fn sample_values() -> Vec<(&'static str, Value)> {
    vec![
        ("scalar", Value::from(2.5)),
        ("int_matrix", Value::Numeric(NumericArray::new([2, 3], vec![1i32, 2, 3, 4, 5, 6]))),
        (
            "cube",
            Value::Numeric(NumericArray::new(
                [2, 3, 2],
                (0..12).map(|i| i as f32 * 0.5).collect::<Vec<f32>>(),
            )),
        ),
        (
            "complex_row",
            Value::Numeric(NumericArray::new(
                [1, 2],
                vec![Complex::new(1.0, -2.0), Complex::new(0.0, 3.5)],
            )),
        ),
        ("empty_matrix", Value::Numeric(NumericArray::empty([0, 3]))),
        ("text", Value::from("hello, archive")),
        ("char_grid", Value::Character(CharArray::with_shape([2, 2], "abcd"))),
        ("flags", Value::Logical(LogicalArray::new([2, 2], vec![true, false, false, true]))),
        (
            "sparse",
            Value::Sparse(SparseMatrix::from_triplets(
                4,
                3,
                vec![(0, 0, 1.0), (2, 1, 0.0), (3, 2, -4.0)],
            )),
        ),
        (
            "mixed_cell",
            Value::Cell(CellArray::new(
                [2, 2],
                vec![1.0.into(), "two".into(), true.into(), vec![4.0, 4.5].into()],
            )),
        ),
        (
            "record",
            Value::Struct(
                StructValue::new()
                    .with_class("Measurement")
                    .with_field("value", 9.81)
                    .with_field("unit", "m/s^2"),
            ),
        ),
    ]
}

/// Struct containing a cell containing a struct.
pub fn nested_value() -> Value {
    let inner = StructValue::new()
        .with_field("id", 7.0)
        .with_field("tags", Value::Cell(CellArray::row(vec!["a".into(), "b".into()])));
    let items = CellArray::row(vec![inner.into(), 3.0.into(), Value::Cell(CellArray::row(vec![]))]);
    Value::Struct(
        StructValue::new()
            .with_field("zeta", "first field")
            .with_field("items", Value::Cell(items))
            .with_field("alpha", false),
    )
}
