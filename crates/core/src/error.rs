//! Error types for sdarc
//!
//! This module defines the error taxonomy shared by every layer of the
//! archive. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.

use crate::record::{FormatVersion, RecordKind};
use thiserror::Error;

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for archive operations
#[derive(Debug, Error)]
pub enum Error {
    /// Mutating operation on a read-only, locked, or closed archive
    #[error("Archive is not writable: {0}")]
    NotWritable(String),

    /// Label is empty or uses characters the archive version forbids
    #[error("Invalid label '{label}': {reason}")]
    LabelInvalid {
        /// The rejected label
        label: String,
        /// Why it was rejected
        reason: String,
    },

    /// A record with this label already exists and overwrite was not requested
    #[error("Label '{0}' already exists")]
    LabelConflict(String),

    /// No record with this label exists
    #[error("Label '{0}' not found")]
    LabelNotFound(String),

    /// Record kind is not supported by the archive's format version
    #[error("Record kind '{kind}' requires format version {required}, archive is {actual}")]
    VersionIncompatible {
        /// The record kind being written
        kind: RecordKind,
        /// First version that supports the kind
        required: FormatVersion,
        /// The archive's fixed version
        actual: FormatVersion,
    },

    /// Value could not be classified and strict handling was requested
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    /// Persisted data is inconsistent with its own metadata
    #[error("Structural corruption: {0}")]
    StructuralCorruption(String),

    /// Failure reported by the underlying container layer
    #[error("Container I/O failure: {0}")]
    ContainerIo(String),

    /// Argument outside its permitted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build a `StructuralCorruption` error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::StructuralCorruption(msg.into())
    }

    /// Build an `InvalidArgument` error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Build a `LabelInvalid` error
    pub fn label_invalid(label: impl Into<String>, reason: impl ToString) -> Self {
        Error::LabelInvalid {
            label: label.into(),
            reason: reason.to_string(),
        }
    }

    /// Prefix a corruption message with the record path it was found under.
    ///
    /// Other variants pass through untouched.
    pub fn at_path(self, path: &str) -> Self {
        match self {
            Error::StructuralCorruption(msg) => {
                Error::StructuralCorruption(format!("{}: {}", path, msg))
            }
            other => other,
        }
    }

    /// True if this error was raised while reading persisted data
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::StructuralCorruption(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_writable() {
        let err = Error::NotWritable("archive is locked".to_string());
        let msg = err.to_string();
        assert!(msg.contains("not writable"));
        assert!(msg.contains("locked"));
    }

    #[test]
    fn test_error_display_label_invalid() {
        let err = Error::label_invalid("a/b", "contains '/'");
        let msg = err.to_string();
        assert!(msg.contains("a/b"));
        assert!(msg.contains("contains '/'"));
    }

    #[test]
    fn test_error_display_version_incompatible() {
        let err = Error::VersionIncompatible {
            kind: RecordKind::File,
            required: FormatVersion::V1_1,
            actual: FormatVersion::V1_0,
        };
        let msg = err.to_string();
        assert!(msg.contains("file"));
        assert!(msg.contains("1.1"));
        assert!(msg.contains("1.0"));
    }

    #[test]
    fn test_at_path_prefixes_corruption_only() {
        let err = Error::corruption("duplicate index").at_path("data/0");
        assert_eq!(
            err.to_string(),
            "Structural corruption: data/0: duplicate index"
        );

        let err = Error::LabelConflict("x".to_string()).at_path("data");
        assert!(matches!(err, Error::LabelConflict(_)));
    }

    #[test]
    fn test_is_corruption() {
        assert!(Error::corruption("bad").is_corruption());
        assert!(!Error::invalid_argument("bad").is_corruption());
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::LabelInvalid {
            label: "".to_string(),
            reason: "empty".to_string(),
        };

        match err {
            Error::LabelInvalid { label, reason } => {
                assert_eq!(label, "");
                assert_eq!(reason, "empty");
            }
            _ => panic!("Wrong error variant"),
        }
    }
}
