//! Record labels and struct field names
//!
//! Labels key records inside their container scope. The rules depend on the
//! archive's format version:
//!
//! - Every version: 1-256 characters, no `/` or `\` (both are used by
//!   container paths)
//! - Format 1.0: identifier-like, i.e. an ASCII letter followed by ASCII
//!   letters, digits or underscores
//!
//! Struct field names are always identifier-like, whatever the version.

use crate::limits::MAX_LABEL_LENGTH;
use crate::record::FormatVersion;
use std::fmt;

/// Characters reserved for container addressing
pub const RESERVED_LABEL_CHARS: [char; 2] = ['/', '\\'];

/// Error when validating a label or field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// Label is empty
    Empty,
    /// Label exceeds maximum length
    TooLong {
        /// Actual length of the label
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Label contains a reserved separator
    ReservedChar {
        /// The reserved character
        char: char,
        /// Position of the character
        position: usize,
    },
    /// Label is not identifier-like where one is required
    NotIdentifier {
        /// The offending character
        char: char,
        /// Position of the character
        position: usize,
    },
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelError::Empty => write!(f, "label cannot be empty"),
            LabelError::TooLong { length, max } => {
                write!(f, "label too long: {} chars (max {})", length, max)
            }
            LabelError::ReservedChar { char, position } => {
                write!(f, "reserved character '{}' at position {}", char, position)
            }
            LabelError::NotIdentifier { char, position } => {
                write!(
                    f,
                    "character '{}' at position {} is not allowed (must start with a letter, then letters, digits, underscore)",
                    char, position
                )
            }
        }
    }
}

impl std::error::Error for LabelError {}

/// Validate a record label under the rules of `version`
pub fn validate_label(label: &str, version: FormatVersion) -> Result<(), LabelError> {
    validate_base(label)?;
    if version.requires_identifier_labels() {
        validate_identifier(label)?;
    }
    Ok(())
}

/// Validate a label for lookup (read paths accept any version's labels)
pub fn validate_lookup_label(label: &str) -> Result<(), LabelError> {
    validate_base(label)
}

/// Validate a struct field name
pub fn validate_field_name(name: &str) -> Result<(), LabelError> {
    validate_base(name)?;
    validate_identifier(name)
}

/// Check if `name` is identifier-like
pub fn is_identifier(name: &str) -> bool {
    validate_identifier(name).is_ok()
}

fn validate_base(label: &str) -> Result<(), LabelError> {
    if label.is_empty() {
        return Err(LabelError::Empty);
    }

    let length = label.chars().count();
    if length > MAX_LABEL_LENGTH {
        return Err(LabelError::TooLong {
            length,
            max: MAX_LABEL_LENGTH,
        });
    }

    for (position, ch) in label.chars().enumerate() {
        if RESERVED_LABEL_CHARS.contains(&ch) {
            return Err(LabelError::ReservedChar { char: ch, position });
        }
    }

    Ok(())
}

fn validate_identifier(name: &str) -> Result<(), LabelError> {
    for (position, ch) in name.chars().enumerate() {
        let ok = if position == 0 {
            ch.is_ascii_alphabetic()
        } else {
            ch.is_ascii_alphanumeric() || ch == '_'
        };
        if !ok {
            return Err(LabelError::NotIdentifier { char: ch, position });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rejected_everywhere() {
        assert_eq!(validate_label("", FormatVersion::V1_0), Err(LabelError::Empty));
        assert_eq!(validate_label("", FormatVersion::V1_1), Err(LabelError::Empty));
        assert_eq!(validate_field_name(""), Err(LabelError::Empty));
    }

    #[test]
    fn test_reserved_chars() {
        for label in ["test/", "a/b", "test\\", "\\x"] {
            assert!(matches!(
                validate_label(label, FormatVersion::V1_1),
                Err(LabelError::ReservedChar { .. })
            ));
            assert!(validate_lookup_label(label).is_err());
        }
    }

    #[test]
    fn test_relaxed_labels_in_1_1() {
        for label in ["example A1", "ReferenceArchive.m", "my function", "1st", "curly 2"] {
            assert!(validate_label(label, FormatVersion::V1_1).is_ok(), "{label}");
        }
    }

    #[test]
    fn test_identifier_labels_in_1_0() {
        assert!(validate_label("matrix1", FormatVersion::V1_0).is_ok());
        assert!(validate_label("a_b_C9", FormatVersion::V1_0).is_ok());

        let err = validate_label("example A1", FormatVersion::V1_0).unwrap_err();
        assert_eq!(err, LabelError::NotIdentifier { char: ' ', position: 7 });

        let err = validate_label("1st", FormatVersion::V1_0).unwrap_err();
        assert_eq!(err, LabelError::NotIdentifier { char: '1', position: 0 });

        assert!(validate_label("_private", FormatVersion::V1_0).is_err());
    }

    #[test]
    fn test_field_names() {
        assert!(validate_field_name("Parameter").is_ok());
        assert!(validate_field_name("x1_y2").is_ok());
        assert!(validate_field_name(" bad").is_err());
        assert!(validate_field_name("has space").is_err());
        assert!(validate_field_name("0").is_err());
        assert!(is_identifier("abc"));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_too_long() {
        let long = "a".repeat(MAX_LABEL_LENGTH + 1);
        assert!(matches!(
            validate_label(&long, FormatVersion::V1_1),
            Err(LabelError::TooLong { .. })
        ));
        let max = "a".repeat(MAX_LABEL_LENGTH);
        assert!(validate_label(&max, FormatVersion::V1_0).is_ok());
    }

    #[test]
    fn test_error_display() {
        let msg = LabelError::ReservedChar { char: '/', position: 4 }.to_string();
        assert!(msg.contains('/'));
        assert!(msg.contains('4'));
    }
}
