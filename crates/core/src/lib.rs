//! Core types for sdarc
//!
//! This crate defines the foundational types used throughout the archive:
//! - Value: the in-memory values that can be archived
//! - RecordKind: the persisted semantic category of a record
//! - FormatVersion: the archive format revision
//! - AttrValue / AttrMap: the self-describing attributes on every node
//! - Label validation rules
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attr;
pub mod error;
pub mod label;
pub mod limits;
pub mod record;
pub mod value;

pub use attr::{AttrMap, AttrMapExt, AttrValue};
pub use error::{Error, Result};
pub use label::{
    is_identifier, validate_field_name, validate_label, validate_lookup_label, LabelError,
};
pub use limits::{is_valid_deflate, MAX_DEFLATE_LEVEL, MAX_LABEL_LENGTH};
pub use record::{FormatVersion, RecordKind};
pub use value::{
    element_count, normalize_shape, CellArray, CharArray, Complex, Dtype, LogicalArray,
    NumericArray, NumericData, OpaqueValue, Shape, SparseMatrix, SparseValues, StructValue, Value,
};
