//! Record codec and compatibility engine for sdarc
//!
//! This crate turns in-memory values into self-describing records inside a
//! [`Container`](sdarc_storage::Container) and back:
//! - classify: value to record kind plus normalized metadata
//! - layout: row-major / column-major conversion
//! - codec: dense, sparse and composite record codecs
//! - envelope / header: the attribute sets on records and on the root
//! - archive: the `Archive` handle enforcing writability, labels and versions
//! - config: `sdarc.toml` settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod classify;
pub(crate) mod codec;
pub mod config;
pub mod envelope;
pub mod header;
pub mod layout;
pub(crate) mod plan;

pub use archive::{Archive, InsertOptions, LabelEntry, RecordInfo};
pub use classify::{classify, Classification, ClassifyError};
pub use config::{ArchiveConfig, UnsupportedPolicy, CONFIG_FILE_NAME};
pub use envelope::RecordEnvelope;
pub use header::ArchiveHeader;
