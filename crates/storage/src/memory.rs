//! In-memory container
//!
//! Holds the whole node tree in memory. It is used directly by tests and
//! as the staging tree behind [`crate::FileContainer`].

use crate::codec::{codec_for_level, get_codec};
use crate::container::{Container, ContainerError, ContainerResult, NodeKind};
use crate::path::NodePath;
use sdarc_core::AttrMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// A node of the container tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Group node
    Group {
        /// Attributes
        attrs: AttrMap,
        /// Children by name
        children: BTreeMap<String, Node>,
    },
    /// Dataset node
    Dataset {
        /// Attributes
        attrs: AttrMap,
        /// Id of the codec that encoded `data`
        codec: String,
        /// Shape hint supplied by the writer
        shape: Vec<u64>,
        /// Encoded bytes
        data: Vec<u8>,
    },
}

impl Node {
    fn empty_group() -> Self {
        Node::Group {
            attrs: AttrMap::new(),
            children: BTreeMap::new(),
        }
    }

    fn attrs(&self) -> &AttrMap {
        match self {
            Node::Group { attrs, .. } | Node::Dataset { attrs, .. } => attrs,
        }
    }

    fn attrs_mut(&mut self) -> &mut AttrMap {
        match self {
            Node::Group { attrs, .. } | Node::Dataset { attrs, .. } => attrs,
        }
    }

    fn kind(&self) -> NodeKind {
        match self {
            Node::Group { .. } => NodeKind::Group,
            Node::Dataset { .. } => NodeKind::Dataset,
        }
    }
}

/// Container keeping its node tree in memory
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryContainer {
    root: Node,
    read_only: bool,
}

impl Default for MemoryContainer {
    fn default() -> Self {
        MemoryContainer::new()
    }
}

impl MemoryContainer {
    /// Create an empty, writable container
    pub fn new() -> Self {
        MemoryContainer {
            root: Node::empty_group(),
            read_only: false,
        }
    }

    /// Wrap an existing tree
    pub fn from_root(root: Node, read_only: bool) -> ContainerResult<Self> {
        if root.kind() != NodeKind::Group {
            return Err(ContainerError::Corrupt("root node is not a group".to_string()));
        }
        Ok(MemoryContainer { root, read_only })
    }

    /// The root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Mark the container read-only (or writable again)
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn node(&self, path: &NodePath) -> ContainerResult<&Node> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = match node {
                Node::Group { children, .. } => children
                    .get(segment)
                    .ok_or_else(|| ContainerError::not_found(path))?,
                Node::Dataset { .. } => return Err(ContainerError::not_found(path)),
            };
        }
        Ok(node)
    }

    fn node_mut(&mut self, path: &NodePath) -> ContainerResult<&mut Node> {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = match node {
                Node::Group { children, .. } => children
                    .get_mut(segment)
                    .ok_or_else(|| ContainerError::not_found(path))?,
                Node::Dataset { .. } => return Err(ContainerError::not_found(path)),
            };
        }
        Ok(node)
    }

    /// Children map of the parent of `path`, plus the child's name
    fn parent_children_mut<'a>(
        &'a mut self,
        path: &'a NodePath,
    ) -> ContainerResult<(&'a mut BTreeMap<String, Node>, &'a str)> {
        let (parent, name) = match (path.parent(), path.name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return Err(ContainerError::InvalidPath(path.to_string())),
        };
        match self.node_mut(&parent)? {
            Node::Group { children, .. } => Ok((children, name)),
            Node::Dataset { .. } => Err(ContainerError::NotAGroup(parent.to_string())),
        }
    }

    fn check_writable(&self) -> ContainerResult<()> {
        if self.read_only {
            Err(ContainerError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn insert_node(&mut self, path: &NodePath, node: Node) -> ContainerResult<()> {
        let (children, name) = self.parent_children_mut(path)?;
        if children.contains_key(name) {
            return Err(ContainerError::AlreadyExists(path.to_string()));
        }
        children.insert(name.to_string(), node);
        Ok(())
    }
}

impl Container for MemoryContainer {
    fn write_attrs(&mut self, path: &NodePath, attrs: &AttrMap) -> ContainerResult<()> {
        self.check_writable()?;
        let target = self.node_mut(path)?.attrs_mut();
        for (name, value) in attrs {
            target.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn read_attrs(&self, path: &NodePath) -> ContainerResult<AttrMap> {
        Ok(self.node(path)?.attrs().clone())
    }

    fn write_buffer(
        &mut self,
        path: &NodePath,
        bytes: &[u8],
        shape: &[usize],
        level: u8,
    ) -> ContainerResult<()> {
        self.check_writable()?;
        let codec = codec_for_level(level);
        let data = codec.encode(bytes)?;
        trace!(path = %path, raw = bytes.len(), stored = data.len(), level, "write buffer");
        let node = Node::Dataset {
            attrs: AttrMap::new(),
            codec: codec.codec_id().to_string(),
            shape: shape.iter().map(|&d| d as u64).collect(),
            data,
        };
        self.insert_node(path, node)
    }

    fn read_buffer(&self, path: &NodePath) -> ContainerResult<(Vec<u8>, Vec<usize>)> {
        match self.node(path)? {
            Node::Dataset {
                codec, shape, data, ..
            } => {
                let bytes = get_codec(codec)?.decode(data)?;
                let shape = shape
                    .iter()
                    .map(|&d| {
                        usize::try_from(d).map_err(|_| {
                            ContainerError::Corrupt(format!("{}: dimension {} overflows", path, d))
                        })
                    })
                    .collect::<ContainerResult<Vec<usize>>>()?;
                Ok((bytes, shape))
            }
            Node::Group { .. } => Err(ContainerError::NotADataset(path.to_string())),
        }
    }

    fn create_group(&mut self, path: &NodePath) -> ContainerResult<()> {
        self.check_writable()?;
        self.insert_node(path, Node::empty_group())
    }

    fn list_children(&self, path: &NodePath) -> ContainerResult<BTreeSet<String>> {
        match self.node(path)? {
            Node::Group { children, .. } => Ok(children.keys().cloned().collect()),
            Node::Dataset { .. } => Err(ContainerError::NotAGroup(path.to_string())),
        }
    }

    fn remove_node(&mut self, path: &NodePath) -> ContainerResult<()> {
        self.take_node(path).map(|_| ())
    }

    fn take_node(&mut self, path: &NodePath) -> ContainerResult<Node> {
        self.check_writable()?;
        let (children, name) = self.parent_children_mut(path)?;
        children
            .remove(name)
            .ok_or_else(|| ContainerError::not_found(path))
    }

    fn restore_node(&mut self, path: &NodePath, node: Node) -> ContainerResult<()> {
        self.check_writable()?;
        self.insert_node(path, node)
    }

    fn node_exists(&self, path: &NodePath) -> bool {
        self.node(path).is_ok()
    }

    fn node_kind(&self, path: &NodePath) -> ContainerResult<NodeKind> {
        Ok(self.node(path)?.kind())
    }

    fn commit(&mut self) -> ContainerResult<()> {
        self.check_writable()
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}
