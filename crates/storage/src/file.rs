//! File-backed container
//!
//! The node tree is staged in memory and persisted as a single file on
//! every commit using the write-fsync-rename pattern, so a reader sees
//! either the previous or the new tree, never a partial one.
//!
//! # Format
//!
//! ```text
//! +------------------+
//! | Magic: "SDAR"    | 4 bytes
//! | Format Version   | 4 bytes (u32 LE)
//! | Container UUID   | 16 bytes
//! | Body Length      | 8 bytes (u64 LE)
//! | Body             | MessagePack node tree
//! | CRC32            | 4 bytes (all preceding bytes)
//! +------------------+
//! ```

use crate::container::{Container, ContainerError, ContainerResult, NodeKind};
use crate::memory::{MemoryContainer, Node};
use crate::path::NodePath;
use sdarc_core::AttrMap;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Container file magic bytes: "SDAR"
pub const CONTAINER_MAGIC: [u8; 4] = *b"SDAR";

/// Current container file format version
pub const CONTAINER_FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 16 + 8;
const CRC_LEN: usize = 4;

/// How to open a container file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, no mutation (`r`)
    ReadOnly,
    /// Existing file, read and write (`r+`)
    ReadWrite,
    /// Create, truncating any existing file (`w`)
    Create,
    /// Create, failing if the file exists (`x`, `w-`)
    CreateNew,
    /// Read and write, creating the file if missing (`a`)
    Append,
}

impl OpenMode {
    /// Parse a mode string (`r`, `r+`, `w`, `x`, `w-`, `a`)
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "r" => Some(OpenMode::ReadOnly),
            "r+" => Some(OpenMode::ReadWrite),
            "w" => Some(OpenMode::Create),
            "x" | "w-" => Some(OpenMode::CreateNew),
            "a" => Some(OpenMode::Append),
            _ => None,
        }
    }

    /// Check if this mode permits mutation
    pub fn is_writable(&self) -> bool {
        !matches!(self, OpenMode::ReadOnly)
    }
}

/// Container persisted to a single file
#[derive(Debug)]
pub struct FileContainer {
    path: PathBuf,
    uuid: [u8; 16],
    tree: MemoryContainer,
    created: bool,
}

impl FileContainer {
    /// Open or create a container file
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> ContainerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let exists = path.exists();

        match mode {
            OpenMode::ReadOnly | OpenMode::ReadWrite if !exists => {
                Err(ContainerError::NotFound(path.display().to_string()))
            }
            OpenMode::CreateNew if exists => {
                Err(ContainerError::AlreadyExists(path.display().to_string()))
            }
            OpenMode::Create | OpenMode::CreateNew => Self::create(path),
            OpenMode::Append if !exists => Self::create(path),
            _ => Self::load(path, mode == OpenMode::ReadOnly),
        }
    }

    fn create(path: PathBuf) -> ContainerResult<Self> {
        let container = FileContainer {
            uuid: *uuid::Uuid::new_v4().as_bytes(),
            tree: MemoryContainer::new(),
            created: true,
            path,
        };
        container.persist()?;
        info!(path = %container.path.display(), "created container file");
        Ok(container)
    }

    fn load(path: PathBuf, read_only: bool) -> ContainerResult<Self> {
        let bytes = std::fs::read(&path)?;
        let (uuid, root) = decode_file(&bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), read_only, "loaded container file");
        Ok(FileContainer {
            path,
            uuid,
            tree: MemoryContainer::from_root(root, read_only)?,
            created: false,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique identifier generated when the file was created
    pub fn uuid(&self) -> uuid::Uuid {
        uuid::Uuid::from_bytes(self.uuid)
    }

    /// Check if this handle created the file (as opposed to opening one)
    pub fn was_created(&self) -> bool {
        self.created
    }

    /// Persist the staged tree atomically (write-fsync-rename)
    fn persist(&self) -> ContainerResult<()> {
        let bytes = encode_file(&self.uuid, self.tree.root())?;
        let temp_path = temp_path(&self.path);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && parent.exists() {
                let dir = File::open(parent)?;
                dir.sync_all()?;
            }
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), "persisted container file");
        Ok(())
    }
}

impl Container for FileContainer {
    fn write_attrs(&mut self, path: &NodePath, attrs: &AttrMap) -> ContainerResult<()> {
        self.tree.write_attrs(path, attrs)
    }

    fn read_attrs(&self, path: &NodePath) -> ContainerResult<AttrMap> {
        self.tree.read_attrs(path)
    }

    fn write_buffer(
        &mut self,
        path: &NodePath,
        bytes: &[u8],
        shape: &[usize],
        level: u8,
    ) -> ContainerResult<()> {
        self.tree.write_buffer(path, bytes, shape, level)
    }

    fn read_buffer(&self, path: &NodePath) -> ContainerResult<(Vec<u8>, Vec<usize>)> {
        self.tree.read_buffer(path)
    }

    fn create_group(&mut self, path: &NodePath) -> ContainerResult<()> {
        self.tree.create_group(path)
    }

    fn list_children(&self, path: &NodePath) -> ContainerResult<BTreeSet<String>> {
        self.tree.list_children(path)
    }

    fn remove_node(&mut self, path: &NodePath) -> ContainerResult<()> {
        self.tree.remove_node(path)
    }

    fn take_node(&mut self, path: &NodePath) -> ContainerResult<Node> {
        self.tree.take_node(path)
    }

    fn restore_node(&mut self, path: &NodePath, node: Node) -> ContainerResult<()> {
        self.tree.restore_node(path, node)
    }

    fn node_exists(&self, path: &NodePath) -> bool {
        self.tree.node_exists(path)
    }

    fn node_kind(&self, path: &NodePath) -> ContainerResult<NodeKind> {
        self.tree.node_kind(path)
    }

    fn commit(&mut self) -> ContainerResult<()> {
        self.tree.commit()?;
        self.persist()
    }

    fn is_read_only(&self) -> bool {
        self.tree.is_read_only()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Serialize a node tree into the container file format
pub fn encode_file(uuid: &[u8; 16], root: &Node) -> ContainerResult<Vec<u8>> {
    let body =
        rmp_serde::to_vec(root).map_err(|e| ContainerError::Serialization(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len() + CRC_LEN);
    bytes.extend_from_slice(&CONTAINER_MAGIC);
    bytes.extend_from_slice(&CONTAINER_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(uuid);
    bytes.extend_from_slice(&(body.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&body);

    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
    Ok(bytes)
}

/// Parse and verify a container file
pub fn decode_file(bytes: &[u8]) -> ContainerResult<([u8; 16], Node)> {
    if bytes.len() < HEADER_LEN + CRC_LEN {
        return Err(ContainerError::Corrupt("container file too short".to_string()));
    }
    if bytes[0..4] != CONTAINER_MAGIC {
        return Err(ContainerError::Corrupt("invalid magic bytes".to_string()));
    }

    let (data, crc_bytes) = bytes.split_at(bytes.len() - CRC_LEN);
    let stored_crc = u32::from_le_bytes(read_array(crc_bytes)?);
    let computed_crc = crc32fast::hash(data);
    if stored_crc != computed_crc {
        return Err(ContainerError::Corrupt(format!(
            "checksum mismatch: expected {:08x}, computed {:08x}",
            stored_crc, computed_crc
        )));
    }

    let version = u32::from_le_bytes(read_array(&data[4..8])?);
    if version != CONTAINER_FORMAT_VERSION {
        return Err(ContainerError::Corrupt(format!(
            "unsupported container format version {}",
            version
        )));
    }

    let uuid: [u8; 16] = read_array(&data[8..24])?;
    let body_len = u64::from_le_bytes(read_array(&data[24..32])?);
    let body = &data[HEADER_LEN..];
    if body.len() as u64 != body_len {
        return Err(ContainerError::Corrupt(format!(
            "body length {} does not match header {}",
            body.len(),
            body_len
        )));
    }

    let root: Node =
        rmp_serde::from_slice(body).map_err(|e| ContainerError::Corrupt(e.to_string()))?;
    Ok((uuid, root))
}

fn read_array<const N: usize>(bytes: &[u8]) -> ContainerResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| ContainerError::Corrupt("truncated header field".to_string()))
}
