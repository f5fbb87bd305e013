//! Addressing of nodes inside a container

use std::fmt;

/// Path of a node, as a sequence of child names below the root.
///
/// The empty path addresses the root group. Segment names never contain
/// `/`; labels are validated before they become segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The root group
    pub fn root() -> Self {
        NodePath::default()
    }

    /// Build a path from segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodePath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Path of a direct child of this node
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        NodePath { segments }
    }

    /// Path of the parent node (`None` for the root)
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(NodePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last segment (`None` for the root)
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// All segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}
