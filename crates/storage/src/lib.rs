//! Container layer for sdarc
//!
//! This crate implements the hierarchical store archives are written to:
//! - Container: trait over a tree of groups and datasets with attributes
//! - MemoryContainer: in-memory tree
//! - FileContainer: tree persisted to one checksummed file
//! - codec: per-buffer compression (identity / zstd)
//! - testing: fault injection for atomicity tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod container;
pub mod file;
pub mod memory;
pub mod path;
pub mod testing;

pub use container::{Container, ContainerError, ContainerResult, NodeKind};
pub use file::{FileContainer, OpenMode};
pub use memory::{MemoryContainer, Node};
pub use path::NodePath;
