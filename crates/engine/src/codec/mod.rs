//! Record codecs
//!
//! Turns planned values into container nodes and back. Dense payloads are
//! datasets; sparse matrices and composites are groups. Every node carries
//! a `RecordType` attribute, so reading dispatches on what is stored and
//! never needs the caller to say what it expects.

pub(crate) mod array;
pub(crate) mod composite;
pub(crate) mod sparse;

use crate::classify::Classification;
use crate::envelope::{RecordEnvelope, CLASS, EMPTY, RECORD_TYPE, SPARSE};
use crate::plan::Planned;
use sdarc_core::{
    AttrMap, AttrMapExt, AttrValue, Error, OpaqueValue, RecordKind, Result, Value,
};
use sdarc_storage::{Container, ContainerError, NodeKind, NodePath};

/// Write one planned node (and everything beneath it) at `path`
pub(crate) fn write_node<C: Container>(
    c: &mut C,
    path: &NodePath,
    node: &Planned<'_>,
    level: u8,
) -> Result<()> {
    match node {
        Planned::Leaf {
            value: Value::Sparse(matrix),
            ..
        } => sparse::write(c, path, matrix, level),
        Planned::Leaf { value, .. } => {
            let encoded = array::encode(value)?;
            c.write_buffer(path, &encoded.bytes, &encoded.shape, level)?;
            c.write_attrs(path, &encoded.attrs)?;
            Ok(())
        }
        Planned::Cell { .. } | Planned::Struct { .. } => composite::write(c, path, node, level),
        Planned::Placeholder { info } => write_placeholder(c, path, info),
    }
}

fn write_placeholder<C: Container>(c: &mut C, path: &NodePath, info: &Classification) -> Result<()> {
    c.write_buffer(path, &[], &[0, 0], 0)?;
    let mut attrs = AttrMap::new();
    attrs.insert(RECORD_TYPE.into(), AttrValue::from(RecordKind::Unsupported.tag()));
    attrs.insert(EMPTY.into(), AttrValue::flag(true));
    if let Some(class_name) = &info.class_name {
        attrs.insert(CLASS.into(), AttrValue::from(class_name.as_str()));
    }
    c.write_attrs(path, &attrs)?;
    Ok(())
}

/// Read the node at `path` back into a value
pub(crate) fn read_node<C: Container>(c: &C, path: &NodePath) -> Result<Value> {
    let attrs = c.read_attrs(path).map_err(structural)?;
    let tag = attrs.require_text(RECORD_TYPE)?;
    let kind = RecordKind::from_tag(tag, attrs.flag_or_false(SPARSE)?);

    match kind {
        RecordKind::Unsupported => Ok(opaque(&attrs, tag)),
        RecordKind::Sparse => {
            expect_node_kind(c, path, NodeKind::Group, kind)?;
            sparse::read(c, path).map(Value::Sparse)
        }
        RecordKind::Cell => {
            expect_node_kind(c, path, NodeKind::Group, kind)?;
            composite::read_cell(c, path, &attrs).map(Value::Cell)
        }
        RecordKind::Struct => {
            expect_node_kind(c, path, NodeKind::Group, kind)?;
            composite::read_struct(c, path, &attrs).map(Value::Struct)
        }
        RecordKind::Numeric | RecordKind::Character | RecordKind::Logical | RecordKind::File => {
            expect_node_kind(c, path, NodeKind::Dataset, kind)?;
            let (bytes, _) = c.read_buffer(path).map_err(structural)?;
            array::decode(kind, &attrs, bytes)
        }
    }
}

/// Error for a node a record needs while reading it.
///
/// A node that is absent or of the wrong kind means the record itself is
/// broken, not the container holding it.
pub(crate) fn structural(e: ContainerError) -> Error {
    match e {
        ContainerError::NotFound(path) => {
            Error::corruption(format!("required node {} is missing", path))
        }
        ContainerError::NotAGroup(path) | ContainerError::NotADataset(path) => {
            Error::corruption(format!("node {} has the wrong kind", path))
        }
        other => other.into(),
    }
}

/// Placeholder for an unsupported or unknown record
fn opaque(attrs: &AttrMap, tag: &str) -> Value {
    let class_name = attrs.text(CLASS).unwrap_or(tag);
    Value::Opaque(OpaqueValue::new(class_name))
}

/// Placeholder for an unsupported top-level record, from its envelope alone
pub(crate) fn opaque_from_envelope(envelope: &RecordEnvelope) -> Value {
    let class_name = envelope.class_name.as_deref().unwrap_or(&envelope.tag);
    Value::Opaque(OpaqueValue::new(class_name))
}

fn expect_node_kind<C: Container>(
    c: &C,
    path: &NodePath,
    expected: NodeKind,
    kind: RecordKind,
) -> Result<()> {
    let actual = c.node_kind(path).map_err(structural)?;
    if actual != expected {
        return Err(Error::corruption(format!(
            "{} record stored as {:?}, expected {:?}",
            kind, actual, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnsupportedPolicy;
    use crate::plan::Planner;
    use sdarc_core::{FormatVersion, NumericArray, SparseMatrix};
    use sdarc_storage::MemoryContainer;

    fn at() -> NodePath {
        NodePath::new(["x"])
    }

    fn roundtrip(value: &Value, level: u8) -> Value {
        let planner = Planner::new(FormatVersion::V1_1, UnsupportedPolicy::Placeholder, None);
        let plan = planner.plan(value).unwrap();
        let mut c = MemoryContainer::new();
        write_node(&mut c, &at(), &plan, level).unwrap();
        read_node(&c, &at()).unwrap()
    }

    #[test]
    fn test_leaf_dispatch() {
        let values = vec![
            Value::from(2.5),
            Value::from("text"),
            Value::from(true),
            Value::File(vec![0, 1, 2, 255]),
            Value::Sparse(SparseMatrix::from_triplets(2, 3, vec![(1, 2, 4.0)])),
            Value::Numeric(NumericArray::empty([0, 3])),
        ];
        for value in values {
            assert_eq!(roundtrip(&value, 0), value);
            assert_eq!(roundtrip(&value, 5), value);
        }
    }

    #[test]
    fn test_placeholder_node() {
        let value = Value::Opaque(OpaqueValue::new("java.lang.Object"));
        let planner = Planner::new(FormatVersion::V1_1, UnsupportedPolicy::Placeholder, None);
        let plan = planner.plan(&value).unwrap();
        let mut c = MemoryContainer::new();
        write_node(&mut c, &at(), &plan, 0).unwrap();

        let attrs = c.read_attrs(&at()).unwrap();
        assert_eq!(attrs[RECORD_TYPE], AttrValue::from("unsupported"));
        assert_eq!(attrs[EMPTY], AttrValue::from("yes"));
        assert_eq!(read_node(&c, &at()).unwrap(), value);
    }

    #[test]
    fn test_unknown_tag_reads_as_opaque() {
        let mut c = MemoryContainer::new();
        c.write_buffer(&at(), &[], &[0, 0], 0).unwrap();
        let mut attrs = AttrMap::new();
        attrs.insert(RECORD_TYPE.into(), AttrValue::from("function"));
        c.write_attrs(&at(), &attrs).unwrap();
        assert_eq!(
            read_node(&c, &at()).unwrap(),
            Value::Opaque(OpaqueValue::new("function"))
        );
    }

    #[test]
    fn test_wrong_node_kind_is_corruption() {
        let mut c = MemoryContainer::new();
        c.create_group(&at()).unwrap();
        let mut attrs = AttrMap::new();
        attrs.insert(RECORD_TYPE.into(), AttrValue::from("numeric"));
        c.write_attrs(&at(), &attrs).unwrap();
        assert!(read_node(&c, &at()).unwrap_err().is_corruption());
    }

    #[test]
    fn test_missing_node_is_corruption() {
        let c = MemoryContainer::new();
        let err = read_node(&c, &at()).unwrap_err();
        assert!(err.is_corruption(), "{}", err);
    }

    #[test]
    fn test_structural_keeps_other_errors() {
        assert!(structural(ContainerError::not_found(&at())).is_corruption());
        assert!(structural(ContainerError::NotADataset("/x".into())).is_corruption());
        assert!(matches!(
            structural(ContainerError::InjectedFault("read".into())),
            Error::ContainerIo(_)
        ));
        assert!(matches!(
            structural(ContainerError::ReadOnly),
            Error::NotWritable(_)
        ));
    }

    #[test]
    fn test_missing_record_type_is_corruption() {
        let mut c = MemoryContainer::new();
        c.create_group(&at()).unwrap();
        assert!(read_node(&c, &at()).unwrap_err().is_corruption());
    }
}
