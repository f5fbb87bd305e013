//! sdarc - self-describing archive for nested, typed data
//!
//! sdarc stores scalars, numeric arrays, text, logical arrays, sparse
//! matrices, cells and structs as self-describing records in a single
//! container, and reconstructs them exactly. Any reader can enumerate an
//! archive's records, their kinds and descriptions without a schema.
//!
//! # Quick Start
//!
//! ```no_run
//! use sdarc::{Archive, ArchiveConfig, InsertOptions, OpenMode, StructValue, Value};
//!
//! let mut archive = Archive::open_file("results.sda", OpenMode::Create, ArchiveConfig::default())?;
//!
//! let run = StructValue::new()
//!     .with_field("iterations", 200.0)
//!     .with_field("name", "baseline");
//! archive.insert_with(
//!     "run1",
//!     &Value::Struct(run),
//!     InsertOptions::new().with_description("first run"),
//! )?;
//!
//! for entry in archive.list_labels()? {
//!     println!("{} ({}): {}", entry.label, entry.kind, entry.description);
//! }
//! archive.close()?;
//! # Ok::<(), sdarc::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `sdarc-core`: value model, record kinds, format versions, labels, errors
//! - `sdarc-storage`: the container trait with in-memory and file containers
//! - `sdarc-engine`: classification, codecs and the [`Archive`] handle

pub use sdarc_core::{
    AttrMap, AttrValue, CellArray, CharArray, Complex, Dtype, Error, FormatVersion, LogicalArray,
    NumericArray, NumericData, OpaqueValue, RecordKind, Result, SparseMatrix, SparseValues,
    StructValue, Value,
};
pub use sdarc_engine::{
    Archive, ArchiveConfig, ArchiveHeader, InsertOptions, LabelEntry, RecordInfo,
    UnsupportedPolicy,
};
pub use sdarc_storage::{Container, FileContainer, MemoryContainer, NodePath, OpenMode};

/// Lower-level building blocks
pub mod core {
    pub use sdarc_core::*;
}

/// Container layer
pub mod storage {
    pub use sdarc_storage::*;
}

/// Codec and compatibility engine
pub mod engine {
    pub use sdarc_engine::*;
}
