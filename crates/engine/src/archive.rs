//! Archive handle and compatibility engine
//!
//! An [`Archive`] owns a container and the archive header held on its root
//! group. Every mutating operation is one transaction:
//!
//! 1. writability and label checks
//! 2. planning (classification, version gating, unsupported-value policy)
//! 3. envelope and payload writes
//! 4. header update and container commit
//!
//! If any step after planning fails, the partially written record is
//! removed and the previous header restored before the error is returned.
//! Nothing reaches a file container until commit, so a failed operation
//! never changes what is on disk.

use crate::codec::{opaque_from_envelope, read_node, structural, write_node};
use crate::config::ArchiveConfig;
use crate::envelope::{RecordEnvelope, ARRAY_SIZE, DESCRIPTION, FIELD_NAMES, RECORD_SIZE, RECORD_TYPE, SPARSE};
use crate::header::{now, ArchiveHeader, FILE_FORMAT};
use crate::plan::{Planned, Planner};
use chrono::NaiveDateTime;
use sdarc_core::{
    is_valid_deflate, validate_label, validate_lookup_label, AttrMap, AttrMapExt, AttrValue,
    Error, FormatVersion, RecordKind, Result, Value, MAX_DEFLATE_LEVEL,
};
use sdarc_storage::{Container, FileContainer, Node, NodePath, OpenMode};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-insert settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Free-text description stored in the envelope
    pub description: String,
    /// Deflate level (archive default if `None`)
    pub deflate: Option<u8>,
    /// Replace an existing record with the same label
    pub overwrite: bool,
}

impl InsertOptions {
    /// Default options: no description, default deflate, no overwrite
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the deflate level
    pub fn with_deflate(mut self, level: u8) -> Self {
        self.deflate = Some(level);
        self
    }

    /// Allow replacing an existing record
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }
}

/// One entry of [`Archive::list_labels`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    /// Record label
    pub label: String,
    /// Stored kind
    pub kind: RecordKind,
    /// Record description
    pub description: String,
}

/// Record metadata read without decoding the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordInfo {
    /// Record label
    pub label: String,
    /// Stored kind
    pub kind: RecordKind,
    /// Record description
    pub description: String,
    /// Deflate level the record was written with
    pub deflate: u8,
    /// Value held no elements
    pub is_empty: bool,
    /// Complex numeric data
    pub is_complex: bool,
    /// Sparse numeric data
    pub is_sparse: bool,
    /// Class-name hint, if any
    pub class_name: Option<String>,
    /// Stored shape (`None` for placeholders)
    pub shape: Option<Vec<usize>>,
    /// Field order of struct records
    pub field_names: Option<Vec<String>>,
}

/// A self-describing archive over a container
pub struct Archive<C: Container> {
    container: C,
    header: ArchiveHeader,
    config: ArchiveConfig,
    clock: fn() -> NaiveDateTime,
}

impl<C: Container> std::fmt::Debug for Archive<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("header", &self.header)
            .field("config", &self.config)
            .field("read_only", &self.container.is_read_only())
            .finish()
    }
}

impl Archive<FileContainer> {
    /// Open an archive file, initializing it if `mode` created the file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sdarc_engine::{Archive, ArchiveConfig};
    /// use sdarc_storage::OpenMode;
    ///
    /// let mut archive = Archive::open_file("data.sda", OpenMode::Append, ArchiveConfig::default())?;
    /// archive.insert("answer", &42.0.into())?;
    /// archive.close()?;
    /// # Ok::<(), sdarc_core::Error>(())
    /// ```
    pub fn open_file(path: impl AsRef<Path>, mode: OpenMode, config: ArchiveConfig) -> Result<Self> {
        config.validate()?;
        let container = FileContainer::open(path, mode)?;
        if !container.was_created() {
            return Archive::open(container, config);
        }

        let created = container.path().to_path_buf();
        Archive::create(container, config).map_err(|e| {
            // a file without a header could never be opened again
            if let Err(remove) = std::fs::remove_file(&created) {
                warn!(target: "sdarc::archive", path = %created.display(), error = %remove, "Could not remove uninitialized file");
            }
            e
        })
    }
}

impl<C: Container> Archive<C> {
    /// Initialize a new archive at the configured default version
    pub fn create(container: C, config: ArchiveConfig) -> Result<Self> {
        let version = config.default_version;
        Self::create_with_version(container, version, config)
    }

    /// Initialize a new archive at an explicit format version
    pub fn create_with_version(
        mut container: C,
        version: FormatVersion,
        config: ArchiveConfig,
    ) -> Result<Self> {
        config.validate()?;
        if container.is_read_only() {
            return Err(Error::NotWritable(
                "cannot initialize a read-only container".to_string(),
            ));
        }

        let root = NodePath::root();
        if container.read_attrs(&root)?.contains_key(FILE_FORMAT) {
            return Err(Error::invalid_argument(
                "container already holds an archive",
            ));
        }

        let header = ArchiveHeader::new(version, now());
        container.write_attrs(&root, &header.to_attrs())?;
        container.commit()?;

        info!(target: "sdarc::archive", version = %version, "Archive created");
        Ok(Archive {
            container,
            header,
            config,
            clock: now,
        })
    }

    /// Open an existing archive, validating its header
    pub fn open(container: C, config: ArchiveConfig) -> Result<Self> {
        config.validate()?;
        let attrs = container.read_attrs(&NodePath::root())?;
        let header = ArchiveHeader::from_attrs(&attrs).map_err(|e| e.at_path("/"))?;

        info!(
            target: "sdarc::archive",
            version = %header.format_version,
            writable = header.writable,
            read_only = container.is_read_only(),
            "Archive opened"
        );
        Ok(Archive {
            container,
            header,
            config,
            clock: now,
        })
    }

    /// Replace the time source used for `Updated` stamps
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Format version, fixed at creation
    pub fn format_version(&self) -> FormatVersion {
        self.header.format_version
    }

    /// Current header
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Active configuration
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Check if mutating operations are permitted
    pub fn is_writable(&self) -> bool {
        self.header.writable && !self.container.is_read_only()
    }

    /// Underlying container
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Underlying container, mutably (bypasses every archive check)
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// Release the archive, returning its container
    pub fn into_container(self) -> C {
        self.container
    }

    /// Close the archive and its container
    pub fn close(self) -> Result<()> {
        self.container.close()?;
        debug!(target: "sdarc::archive", "Archive closed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert `value` under `label` with default options
    pub fn insert(&mut self, label: &str, value: &Value) -> Result<()> {
        self.insert_with(label, value, InsertOptions::default())
    }

    /// Insert `value` under `label`
    pub fn insert_with(&mut self, label: &str, value: &Value, options: InsertOptions) -> Result<()> {
        self.ensure_writable()?;

        let deflate = options.deflate.unwrap_or(self.config.default_deflate);
        if !is_valid_deflate(deflate) {
            return Err(Error::invalid_argument(format!(
                "deflate level must be 0-{}, got {}",
                MAX_DEFLATE_LEVEL, deflate
            )));
        }

        let version = self.header.format_version;
        validate_label(label, version).map_err(|e| Error::label_invalid(label, e))?;

        let path = NodePath::new([label]);
        let exists = self.container.node_exists(&path);
        if exists && !options.overwrite {
            return Err(Error::LabelConflict(label.to_string()));
        }

        let planner = Planner::new(version, self.config.effective_policy(), self.config.max_depth);
        let planned = planner.plan(value)?;

        let info = planned.info();
        let mut envelope = RecordEnvelope::new(info.kind, options.description, deflate);
        envelope.is_empty = info.is_empty;
        envelope.is_complex = info.is_complex;
        envelope.class_name = info.class_name.clone();

        // the old record stays detached until the new one is committed
        let previous = if exists {
            Some(self.container.take_node(&path)?)
        } else {
            None
        };

        let result = self.write_record(&path, &planned, &envelope).and_then(|()| {
            let next = self.header.touched((self.clock)());
            self.publish(next)
        });
        if let Err(e) = result {
            self.discard(&path, &e);
            if let Some(node) = previous {
                self.reinstate(&path, node);
            }
            return Err(e);
        }

        debug!(
            target: "sdarc::archive",
            label = %label,
            kind = %envelope.kind,
            deflate,
            overwrite = exists,
            "Record inserted"
        );
        Ok(())
    }

    fn write_record(&mut self, path: &NodePath, planned: &Planned<'_>, envelope: &RecordEnvelope) -> Result<()> {
        if planned.kind().is_composite() {
            write_node(&mut self.container, path, planned, envelope.deflate)?;
            self.container.write_attrs(path, &envelope.to_attrs())?;
        } else {
            self.container.create_group(path)?;
            self.container.write_attrs(path, &envelope.to_attrs())?;
            let payload = payload_path(path)?;
            write_node(&mut self.container, &payload, planned, envelope.deflate)?;
        }
        Ok(())
    }

    /// Remove a partially written record after a failed insert
    fn discard(&mut self, path: &NodePath, cause: &Error) {
        warn!(target: "sdarc::archive", path = %path, error = %cause, "Insert failed, rolling back");
        if self.container.node_exists(path) {
            if let Err(e) = self.container.remove_node(path) {
                warn!(target: "sdarc::archive", path = %path, error = %e, "Rollback could not remove record");
            }
        }
    }

    /// Put back a record detached by a mutation that then failed
    fn reinstate(&mut self, path: &NodePath, node: Node) {
        if let Err(e) = self.container.restore_node(path, node) {
            warn!(target: "sdarc::archive", path = %path, error = %e, "Rollback could not restore record");
        }
    }

    /// Write `next` to the root and commit; restores the previous header on failure
    fn publish(&mut self, next: ArchiveHeader) -> Result<()> {
        let root = NodePath::root();
        let result = self
            .container
            .write_attrs(&root, &next.to_attrs())
            .and_then(|()| self.container.commit());

        match result {
            Ok(()) => {
                self.header = next;
                Ok(())
            }
            Err(e) => {
                if let Err(restore) = self.container.write_attrs(&root, &self.header.to_attrs()) {
                    warn!(target: "sdarc::archive", error = %restore, "Could not restore archive header");
                }
                Err(e.into())
            }
        }
    }

    /// Remove the record under `label` and everything beneath it
    pub fn remove(&mut self, label: &str) -> Result<()> {
        self.remove_many(&[label])
    }

    /// Remove several records; every label is checked before anything is removed
    pub fn remove_many<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<()> {
        self.ensure_writable()?;
        let paths = labels
            .iter()
            .map(|label| self.record_path(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut taken = Vec::with_capacity(paths.len());
        for path in &paths {
            // the same label may be listed twice
            if !self.container.node_exists(path) {
                continue;
            }
            match self.container.take_node(path) {
                Ok(node) => taken.push((path, node)),
                Err(e) => {
                    self.reinstate_all(taken);
                    return Err(e.into());
                }
            }
        }

        let next = self.header.touched((self.clock)());
        if let Err(e) = self.publish(next) {
            warn!(target: "sdarc::archive", error = %e, "Remove failed, rolling back");
            self.reinstate_all(taken);
            return Err(e);
        }
        debug!(target: "sdarc::archive", count = paths.len(), "Records removed");
        Ok(())
    }

    fn reinstate_all(&mut self, taken: Vec<(&NodePath, Node)>) {
        for (path, node) in taken.into_iter().rev() {
            self.reinstate(path, node);
        }
    }

    /// Replace a record's description
    pub fn set_description(&mut self, label: &str, description: &str) -> Result<()> {
        self.ensure_writable()?;
        let path = self.record_path(label)?;
        let previous = self.read_envelope(label, &path)?.description;

        let mut attrs = AttrMap::new();
        attrs.insert(DESCRIPTION.into(), AttrValue::from(description));
        self.container.write_attrs(&path, &attrs)?;

        let next = self.header.touched((self.clock)());
        if let Err(e) = self.publish(next) {
            attrs.insert(DESCRIPTION.into(), AttrValue::from(previous));
            if let Err(restore) = self.container.write_attrs(&path, &attrs) {
                warn!(target: "sdarc::archive", label = %label, error = %restore, "Could not restore description");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Overwrite an existing record, keeping its description and deflate level
    pub fn replace(&mut self, label: &str, value: &Value) -> Result<()> {
        self.ensure_writable()?;
        let path = self.record_path(label)?;
        let envelope = self.read_envelope(label, &path)?;
        let options = InsertOptions::new()
            .with_description(envelope.description)
            .with_deflate(envelope.deflate)
            .overwrite();
        self.insert_with(label, value, options)
    }

    /// Lock the archive (`false`), permanently.
    ///
    /// Passing `true` succeeds only if the archive is still writable; a
    /// locked archive cannot be unlocked.
    pub fn set_writable(&mut self, writable: bool) -> Result<()> {
        if writable {
            return self.ensure_writable();
        }
        if !self.header.writable {
            return Ok(());
        }
        self.ensure_writable()?;
        let next = self.header.locked((self.clock)());
        self.publish(next)?;
        info!(target: "sdarc::archive", "Archive locked");
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.container.is_read_only() {
            return Err(Error::NotWritable("container is open read-only".to_string()));
        }
        if !self.header.writable {
            return Err(Error::NotWritable("archive is locked".to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Reconstruct the value stored under `label`
    pub fn extract(&self, label: &str) -> Result<Value> {
        let path = self.record_path(label)?;
        let envelope = self.read_envelope(label, &path)?;
        self.extract_record(&path, &envelope)
            .map_err(|e| e.at_path(label))
    }

    fn extract_record(&self, path: &NodePath, envelope: &RecordEnvelope) -> Result<Value> {
        match envelope.kind {
            RecordKind::Unsupported => Ok(opaque_from_envelope(envelope)),
            kind if kind.is_composite() => read_node(&self.container, path),
            kind => {
                let payload = payload_path(path)?;
                let attrs = self.container.read_attrs(&payload).map_err(structural)?;
                let stored = RecordKind::from_tag(
                    attrs.require_text(RECORD_TYPE)?,
                    attrs.flag_or_false(SPARSE)?,
                );
                if stored != kind {
                    return Err(Error::corruption(format!(
                        "envelope says {} but payload is {}",
                        kind, stored
                    )));
                }
                read_node(&self.container, &payload)
            }
        }
    }

    /// Extract every record, keeping per-record failures
    pub fn extract_all(&self) -> Result<Vec<(String, Result<Value>)>> {
        Ok(self
            .labels()?
            .into_iter()
            .map(|label| {
                let value = self.extract(&label);
                (label, value)
            })
            .collect())
    }

    /// Labels, kinds and descriptions in label order.
    ///
    /// Records whose envelope cannot be read are skipped with a warning.
    pub fn list_labels(&self) -> Result<Vec<LabelEntry>> {
        let mut entries = Vec::new();
        for label in self.container.list_children(&NodePath::root())? {
            let path = NodePath::new([label.as_str()]);
            match self.read_envelope(&label, &path) {
                Ok(envelope) => entries.push(LabelEntry {
                    label,
                    kind: envelope.kind,
                    description: envelope.description,
                }),
                Err(e) => {
                    warn!(target: "sdarc::archive", label = %label, error = %e, "Skipping unreadable record");
                }
            }
        }
        Ok(entries)
    }

    /// Every label in order
    pub fn labels(&self) -> Result<Vec<String>> {
        Ok(self
            .container
            .list_children(&NodePath::root())?
            .into_iter()
            .collect())
    }

    /// Check if a record exists under `label`
    pub fn contains(&self, label: &str) -> bool {
        validate_lookup_label(label).is_ok() && self.container.node_exists(&NodePath::new([label]))
    }

    /// Metadata of one record
    pub fn describe(&self, label: &str) -> Result<RecordInfo> {
        let path = self.record_path(label)?;
        self.describe_record(label, &path)
            .map_err(|e| e.at_path(label))
    }

    fn describe_record(&self, label: &str, path: &NodePath) -> Result<RecordInfo> {
        let attrs = self.container.read_attrs(path)?;
        let envelope = RecordEnvelope::from_attrs(&attrs)?;

        let (shape, field_names) = match envelope.kind {
            RecordKind::Unsupported => (None, None),
            RecordKind::Cell => (Some(attrs.require_shape(RECORD_SIZE)?), None),
            RecordKind::Struct => {
                let names = attrs
                    .require_text(FIELD_NAMES)?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (Some(vec![1, 1]), Some(names))
            }
            _ => {
                let payload = self
                    .container
                    .read_attrs(&payload_path(path)?)
                    .map_err(structural)?;
                (Some(payload.require_shape(ARRAY_SIZE)?), None)
            }
        };

        Ok(RecordInfo {
            label: label.to_string(),
            is_sparse: envelope.is_sparse(),
            kind: envelope.kind,
            description: envelope.description,
            deflate: envelope.deflate,
            is_empty: envelope.is_empty,
            is_complex: envelope.is_complex,
            class_name: envelope.class_name,
            shape,
            field_names,
        })
    }

    /// Metadata of every record whose label starts with `prefix`.
    ///
    /// An empty prefix matches everything. Unreadable records are skipped
    /// with a warning.
    pub fn probe(&self, prefix: &str) -> Result<Vec<RecordInfo>> {
        let mut infos = Vec::new();
        for label in self.labels()? {
            if !label.starts_with(prefix) {
                continue;
            }
            let path = NodePath::new([label.as_str()]);
            match self.describe_record(&label, &path) {
                Ok(info) => infos.push(info),
                Err(e) => {
                    warn!(target: "sdarc::archive", label = %label, error = %e, "Skipping unreadable record");
                }
            }
        }
        Ok(infos)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Path of an existing record
    fn record_path(&self, label: &str) -> Result<NodePath> {
        validate_lookup_label(label).map_err(|e| Error::label_invalid(label, e))?;
        let path = NodePath::new([label]);
        if !self.container.node_exists(&path) {
            return Err(Error::LabelNotFound(label.to_string()));
        }
        Ok(path)
    }

    fn read_envelope(&self, label: &str, path: &NodePath) -> Result<RecordEnvelope> {
        let attrs = self.container.read_attrs(path)?;
        RecordEnvelope::from_attrs(&attrs).map_err(|e| e.at_path(label))
    }
}

/// Payload node of a non-composite record: `/<label>/<label>`
fn payload_path(record: &NodePath) -> Result<NodePath> {
    record
        .name()
        .map(|name| record.child(name))
        .ok_or_else(|| Error::invalid_argument("the root is not a record"))
}
