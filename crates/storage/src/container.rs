//! The hierarchical container abstraction
//!
//! A container is a tree of named nodes. Groups hold attributes and
//! children; datasets hold attributes and one typed byte buffer with a
//! shape. The archive engine only talks to storage through this trait.

use crate::codec::CodecError;
use crate::memory::Node;
use crate::path::NodePath;
use sdarc_core::AttrMap;
use std::collections::BTreeSet;

/// Result type for container operations
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// Kind of a container node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Node with attributes and children
    Group,
    /// Node with attributes and a byte buffer
    Dataset,
}

/// Hierarchical attribute/buffer store.
///
/// Mutations are staged until [`Container::commit`]; a container that is
/// dropped without committing leaves the persisted state untouched.
pub trait Container {
    /// Merge `attrs` into the attributes of an existing node
    fn write_attrs(&mut self, path: &NodePath, attrs: &AttrMap) -> ContainerResult<()>;

    /// Read all attributes of a node
    fn read_attrs(&self, path: &NodePath) -> ContainerResult<AttrMap>;

    /// Create a dataset holding `bytes`, compressed at `level` (0 = none)
    fn write_buffer(
        &mut self,
        path: &NodePath,
        bytes: &[u8],
        shape: &[usize],
        level: u8,
    ) -> ContainerResult<()>;

    /// Read a dataset's decompressed bytes and shape hint
    fn read_buffer(&self, path: &NodePath) -> ContainerResult<(Vec<u8>, Vec<usize>)>;

    /// Create an empty group. Fails if the node already exists.
    fn create_group(&mut self, path: &NodePath) -> ContainerResult<()>;

    /// Names of a group's direct children
    fn list_children(&self, path: &NodePath) -> ContainerResult<BTreeSet<String>>;

    /// Remove a node and everything beneath it
    fn remove_node(&mut self, path: &NodePath) -> ContainerResult<()>;

    /// Detach a node and everything beneath it, handing the subtree back
    /// so it can be put back with [`Container::restore_node`]
    fn take_node(&mut self, path: &NodePath) -> ContainerResult<Node>;

    /// Reattach a detached subtree at `path`. Fails if the node already exists.
    fn restore_node(&mut self, path: &NodePath, node: Node) -> ContainerResult<()>;

    /// Check if a node exists
    fn node_exists(&self, path: &NodePath) -> bool;

    /// Kind of an existing node
    fn node_kind(&self, path: &NodePath) -> ContainerResult<NodeKind>;

    /// Persist all staged mutations
    fn commit(&mut self) -> ContainerResult<()>;

    /// Check if the container rejects mutations
    fn is_read_only(&self) -> bool;

    /// Release the container, persisting staged mutations if writable
    fn close(mut self) -> ContainerResult<()>
    where
        Self: Sized,
    {
        if self.is_read_only() {
            Ok(())
        } else {
            self.commit()
        }
    }
}

/// Errors from container operations
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Node does not exist
    #[error("Node not found: {0}")]
    NotFound(String),

    /// Node already exists
    #[error("Node already exists: {0}")]
    AlreadyExists(String),

    /// Node is a dataset where a group was expected
    #[error("Not a group: {0}")]
    NotAGroup(String),

    /// Node is a group where a dataset was expected
    #[error("Not a dataset: {0}")]
    NotADataset(String),

    /// Operation not allowed on this path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Container was opened read-only
    #[error("Container is read-only")]
    ReadOnly,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Container file is damaged
    #[error("Corrupt container: {0}")]
    Corrupt(String),

    /// Buffer codec failure
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Node tree could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure injected by the testing harness
    #[error("Injected fault: {0}")]
    InjectedFault(String),
}

impl ContainerError {
    /// Build a `NotFound` error for a path
    pub fn not_found(path: &NodePath) -> Self {
        ContainerError::NotFound(path.to_string())
    }
}

impl From<ContainerError> for sdarc_core::Error {
    fn from(e: ContainerError) -> Self {
        match e {
            ContainerError::ReadOnly => {
                sdarc_core::Error::NotWritable("container is read-only".to_string())
            }
            ContainerError::Corrupt(msg) => sdarc_core::Error::StructuralCorruption(msg),
            ContainerError::Codec(CodecError::DecodeError(msg)) => {
                sdarc_core::Error::StructuralCorruption(msg)
            }
            other => sdarc_core::Error::ContainerIo(other.to_string()),
        }
    }
}
