//! Fault injection for container operations

use crate::container::{Container, ContainerError, ContainerResult, NodeKind};
use crate::memory::Node;
use crate::path::NodePath;
use sdarc_core::AttrMap;
use std::collections::BTreeSet;

/// Operation at which a fault is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// Fail every buffer write after the first `after` succeed
    WriteBuffer {
        /// Writes allowed before failing
        after: usize,
    },
    /// Fail every attribute write after the first `after` succeed
    WriteAttrs {
        /// Writes allowed before failing
        after: usize,
    },
    /// Fail every group creation after the first `after` succeed
    CreateGroup {
        /// Creations allowed before failing
        after: usize,
    },
    /// Fail every commit
    Commit,
}

/// Container wrapper that fails at a configured point.
///
/// Removal, detach/restore and reads are never faulted, so rollback paths
/// run against the real inner container.
#[derive(Debug)]
pub struct FaultyContainer<C> {
    inner: C,
    fault: Option<FaultPoint>,
    buffer_writes: usize,
    attr_writes: usize,
    group_creates: usize,
    triggered: usize,
}

impl<C: Container> FaultyContainer<C> {
    /// Wrap `inner`, failing at `fault`
    pub fn new(inner: C, fault: FaultPoint) -> Self {
        FaultyContainer {
            inner,
            fault: Some(fault),
            buffer_writes: 0,
            attr_writes: 0,
            group_creates: 0,
            triggered: 0,
        }
    }

    /// Arm a different fault, resetting the operation counters
    pub fn arm(&mut self, fault: FaultPoint) {
        self.fault = Some(fault);
        self.buffer_writes = 0;
        self.attr_writes = 0;
        self.group_creates = 0;
    }

    /// Stop injecting faults
    pub fn disarm(&mut self) {
        self.fault = None;
    }

    /// Number of faults injected so far
    pub fn faults_triggered(&self) -> usize {
        self.triggered
    }

    /// The wrapped container
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwrap the container
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn fail(&mut self, what: &str, path: &NodePath) -> ContainerError {
        self.triggered += 1;
        ContainerError::InjectedFault(format!("{} at {}", what, path))
    }
}

impl<C: Container> Container for FaultyContainer<C> {
    fn write_attrs(&mut self, path: &NodePath, attrs: &AttrMap) -> ContainerResult<()> {
        self.attr_writes += 1;
        if let Some(FaultPoint::WriteAttrs { after }) = self.fault {
            if self.attr_writes > after {
                return Err(self.fail("write_attrs", path));
            }
        }
        self.inner.write_attrs(path, attrs)
    }

    fn read_attrs(&self, path: &NodePath) -> ContainerResult<AttrMap> {
        self.inner.read_attrs(path)
    }

    fn write_buffer(
        &mut self,
        path: &NodePath,
        bytes: &[u8],
        shape: &[usize],
        level: u8,
    ) -> ContainerResult<()> {
        self.buffer_writes += 1;
        if let Some(FaultPoint::WriteBuffer { after }) = self.fault {
            if self.buffer_writes > after {
                return Err(self.fail("write_buffer", path));
            }
        }
        self.inner.write_buffer(path, bytes, shape, level)
    }

    fn read_buffer(&self, path: &NodePath) -> ContainerResult<(Vec<u8>, Vec<usize>)> {
        self.inner.read_buffer(path)
    }

    fn create_group(&mut self, path: &NodePath) -> ContainerResult<()> {
        self.group_creates += 1;
        if let Some(FaultPoint::CreateGroup { after }) = self.fault {
            if self.group_creates > after {
                return Err(self.fail("create_group", path));
            }
        }
        self.inner.create_group(path)
    }

    fn list_children(&self, path: &NodePath) -> ContainerResult<BTreeSet<String>> {
        self.inner.list_children(path)
    }

    fn remove_node(&mut self, path: &NodePath) -> ContainerResult<()> {
        self.inner.remove_node(path)
    }

    fn take_node(&mut self, path: &NodePath) -> ContainerResult<Node> {
        self.inner.take_node(path)
    }

    fn restore_node(&mut self, path: &NodePath, node: Node) -> ContainerResult<()> {
        self.inner.restore_node(path, node)
    }

    fn node_exists(&self, path: &NodePath) -> bool {
        self.inner.node_exists(path)
    }

    fn node_kind(&self, path: &NodePath) -> ContainerResult<NodeKind> {
        self.inner.node_kind(path)
    }

    fn commit(&mut self) -> ContainerResult<()> {
        if let Some(FaultPoint::Commit) = self.fault {
            return Err(self.fail("commit", &NodePath::root()));
        }
        self.inner.commit()
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }
}
