//! File-backed archive tests
//!
//! Records must survive close and reopen, read-only handles must refuse
//! mutation, and damaged files must be reported rather than misread.

mod common;

use common::*;
use sdarc::engine::CONFIG_FILE_NAME;
use sdarc::storage::testing::{FaultPoint, FaultyContainer};
use sdarc::{
    Archive, ArchiveConfig, CellArray, Error, FileContainer, FormatVersion, InsertOptions,
    OpaqueValue, OpenMode, RecordKind, UnsupportedPolicy, Value,
};
use std::fs;

#[test]
fn test_reopen_yields_identical_records() {
    let test = TestArchive::new();
    {
        let mut archive = test.writer();
        for (label, value) in sample_values() {
            archive
                .insert_with(label, &value, InsertOptions::new().with_description(label).with_deflate(6))
                .unwrap();
        }
        archive.insert("nested", &nested_value()).unwrap();
        archive.close().unwrap();
    }

    let archive = test.reader();
    assert_eq!(archive.format_version(), FormatVersion::V1_1);
    for (label, value) in sample_values() {
        assert_eq!(archive.extract(label).unwrap(), value, "{label}");
        let info = archive.describe(label).unwrap();
        assert_eq!(info.description, label);
        assert_eq!(info.deflate, 6);
    }
    assert_eq!(archive.extract("nested").unwrap(), nested_value());

    let labels = archive.labels().unwrap();
    let mut sorted = labels.clone();
    sorted.sort();
    assert_eq!(labels, sorted);
}

#[test]
fn test_header_survives_reopen() {
    let test = TestArchive::new();
    let created = {
        let mut archive = test.writer().with_clock(fixed_clock);
        archive.insert("a", &1.0.into()).unwrap();
        let created = archive.header().created;
        archive.close().unwrap();
        created
    };

    let archive = test.reader();
    assert_eq!(archive.header().created, created);
    assert_eq!(archive.header().updated, fixed_clock());
    assert!(archive.header().writable);
}

#[test]
fn test_read_only_open_rejects_mutation() {
    let test = TestArchive::new();
    {
        let mut archive = test.writer();
        archive.insert("a", &1.0.into()).unwrap();
        archive.close().unwrap();
    }
    let before = fs::read(&test.path).unwrap();

    let mut archive = test.reader();
    assert!(!archive.is_writable());
    assert!(matches!(archive.insert("b", &2.0.into()), Err(Error::NotWritable(_))));
    assert!(matches!(archive.remove("a"), Err(Error::NotWritable(_))));
    assert_eq!(archive.extract("a").unwrap(), Value::from(1.0));
    archive.close().unwrap();

    assert_eq!(fs::read(&test.path).unwrap(), before);
}

#[test]
fn test_lock_persists() {
    let test = TestArchive::new();
    {
        let mut archive = test.writer();
        archive.set_writable(false).unwrap();
        archive.close().unwrap();
    }
    let mut archive = test.writer();
    assert!(!archive.is_writable());
    assert!(matches!(archive.insert("a", &1.0.into()), Err(Error::NotWritable(_))));
}

#[test]
fn test_failed_insert_never_reaches_disk() {
    let test = TestArchive::new();
    let before = fs::read(&test.path).unwrap();
    {
        let mut archive = Archive::open_file(
            &test.path,
            OpenMode::ReadWrite,
            ArchiveConfig::default().with_unsupported_policy(UnsupportedPolicy::Reject),
        )
        .unwrap();
        let value = Value::Cell(CellArray::row(vec![1.0.into(), OpaqueValue::new("handle").into()]));
        assert!(archive.insert("c", &value).is_err());
        archive.close().unwrap();
    }
    assert_eq!(fs::read(&test.path).unwrap(), before);
}

#[test]
fn test_failed_overwrite_keeps_record_on_disk() {
    let test = TestArchive::new();
    {
        let mut archive = test.writer();
        archive.insert("x", &1.0.into()).unwrap();
        archive.close().unwrap();
    }

    let container = FileContainer::open(&test.path, OpenMode::ReadWrite).unwrap();
    let faulty = FaultyContainer::new(container, FaultPoint::WriteBuffer { after: 0 });
    let mut archive = Archive::open(faulty, ArchiveConfig::default()).unwrap();
    assert!(archive
        .insert_with("x", &2.0.into(), InsertOptions::new().overwrite())
        .is_err());

    archive.container_mut().disarm();
    archive.insert("y", &3.0.into()).unwrap();
    archive.close().unwrap();

    let reader = test.reader();
    assert_eq!(reader.labels().unwrap(), vec!["x", "y"]);
    assert_eq!(reader.extract("x").unwrap(), Value::from(1.0));
}

#[test]
fn test_invalid_config_leaves_no_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = ArchiveConfig::default().with_default_deflate(12);

    let path = dir.path().join("new.sda");
    for mode in [OpenMode::Create, OpenMode::CreateNew, OpenMode::Append] {
        let err = Archive::open_file(&path, mode, config.clone()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!path.exists());
    }

    // an existing archive is not truncated either
    let test = TestArchive::new();
    {
        let mut archive = test.writer();
        archive.insert("kept", &1.0.into()).unwrap();
        archive.close().unwrap();
    }
    assert!(Archive::open_file(&test.path, OpenMode::Create, config).is_err());
    assert!(test.reader().contains("kept"));
}

#[test]
fn test_open_modes() {
    let test = TestArchive::new();

    // create-new refuses an existing file
    assert!(matches!(
        Archive::open_file(&test.path, OpenMode::CreateNew, ArchiveConfig::default()),
        Err(Error::ContainerIo(_))
    ));

    // append opens the existing archive
    {
        let mut archive = test.open(OpenMode::Append);
        archive.insert("kept", &1.0.into()).unwrap();
        archive.close().unwrap();
    }
    assert!(test.reader().contains("kept"));

    // create truncates
    {
        let archive = test.open(OpenMode::Create);
        assert!(archive.labels().unwrap().is_empty());
        archive.close().unwrap();
    }

    let missing = test.dir.path().join("missing.sda");
    assert!(Archive::open_file(&missing, OpenMode::ReadOnly, ArchiveConfig::default()).is_err());
    let appended = Archive::open_file(&missing, OpenMode::Append, ArchiveConfig::default()).unwrap();
    assert!(appended.is_writable());
}

#[test]
fn test_corrupted_file_rejected() {
    let test = TestArchive::new();
    {
        let mut archive = test.writer();
        archive.insert("a", &vec![1.0, 2.0, 3.0].into()).unwrap();
        archive.close().unwrap();
    }

    let mut bytes = fs::read(&test.path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    fs::write(&test.path, &bytes).unwrap();

    let err = Archive::open_file(&test.path, OpenMode::ReadOnly, ArchiveConfig::default()).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_bad_magic_rejected() {
    let test = TestArchive::new();
    let mut bytes = fs::read(&test.path).unwrap();
    bytes[..4].copy_from_slice(b"HDF5");
    fs::write(&test.path, &bytes).unwrap();

    let err = Archive::open_file(&test.path, OpenMode::ReadOnly, ArchiveConfig::default()).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_container_without_header_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bare.sda");
    FileContainer::open(&path, OpenMode::Create).unwrap();

    let err = Archive::open_file(&path, OpenMode::ReadOnly, ArchiveConfig::default()).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_config_file_drives_new_archives() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &config_path,
        "default_version = \"1.0\"\ndefault_deflate = 5\nstrict = true\n",
    )
    .unwrap();
    let config = ArchiveConfig::from_file(&config_path).unwrap();

    let path = dir.path().join("configured.sda");
    let mut archive = Archive::open_file(&path, OpenMode::Create, config).unwrap();
    assert_eq!(archive.format_version(), FormatVersion::V1_0);

    archive.insert("x", &1.0.into()).unwrap();
    assert_eq!(archive.describe("x").unwrap().deflate, 5);
    assert!(matches!(
        archive.insert("h", &OpaqueValue::new("h").into()),
        Err(Error::UnsupportedValue(_))
    ));
    archive.close().unwrap();

    // the version is fixed at creation, not by later configuration
    let reopened = Archive::open_file(&path, OpenMode::ReadOnly, ArchiveConfig::default()).unwrap();
    assert_eq!(reopened.format_version(), FormatVersion::V1_0);
    assert_eq!(reopened.list_labels().unwrap()[0].kind, RecordKind::Numeric);
}
