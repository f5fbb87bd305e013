//! Cell and struct codec
//!
//! Composites are groups whose children are full records. Cell children
//! are named by their column-major position (`0`, `1`, ...); archives
//! written by older tools name them `element 1`, `element 2`, ... and both
//! forms are read. Struct children are named by field, with the field
//! order kept in the `FieldNames` attribute.

use super::{read_node, structural, write_node};
use crate::envelope::{CLASS, EMPTY, FIELD_NAMES, RECORD_SIZE, RECORD_TYPE};
use crate::layout::{column_major_order, from_column_major};
use crate::plan::Planned;
use sdarc_core::{
    element_count, AttrMap, AttrMapExt, AttrValue, CellArray, Error, RecordKind, Result,
    StructValue, Value,
};
use sdarc_storage::{Container, NodePath};
use std::collections::BTreeSet;

const LEGACY_ELEMENT_PREFIX: &str = "element ";

/// Write a planned cell or struct as a group at `path`
pub(crate) fn write<C: Container>(
    c: &mut C,
    path: &NodePath,
    node: &Planned<'_>,
    level: u8,
) -> Result<()> {
    match node {
        Planned::Cell { info, elements } => {
            c.create_group(path)?;
            let mut attrs = AttrMap::new();
            attrs.insert(RECORD_TYPE.into(), AttrValue::from(RecordKind::Cell.tag()));
            attrs.insert(EMPTY.into(), AttrValue::flag(info.is_empty));
            attrs.insert(RECORD_SIZE.into(), AttrValue::dims(&info.shape));
            c.write_attrs(path, &attrs)?;

            for (position, row_major) in column_major_order(&info.shape).into_iter().enumerate() {
                let element = elements.get(row_major).ok_or_else(|| {
                    Error::invalid_argument(format!("cell element {} missing from plan", row_major))
                })?;
                write_node(c, &path.child(position.to_string()), element, level)?;
            }
            Ok(())
        }
        Planned::Struct { info, fields } => {
            c.create_group(path)?;
            let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
            let mut attrs = AttrMap::new();
            attrs.insert(RECORD_TYPE.into(), AttrValue::from(RecordKind::Struct.tag()));
            attrs.insert(EMPTY.into(), AttrValue::flag(info.is_empty));
            attrs.insert(FIELD_NAMES.into(), AttrValue::from(names.join(" ")));
            if let Some(class_name) = &info.class_name {
                attrs.insert(CLASS.into(), AttrValue::from(class_name.as_str()));
            }
            c.write_attrs(path, &attrs)?;

            for (name, field) in fields {
                write_node(c, &path.child(*name), field, level)?;
            }
            Ok(())
        }
        other => Err(Error::invalid_argument(format!(
            "{} is not a composite",
            other.kind()
        ))),
    }
}

/// Read the cell group at `path`
pub(crate) fn read_cell<C: Container>(c: &C, path: &NodePath, attrs: &AttrMap) -> Result<CellArray> {
    let shape = attrs.require_shape(RECORD_SIZE)?;
    let count = element_count(&shape)
        .ok_or_else(|| Error::corruption(format!("cell shape {:?} overflows", shape)))?;

    let children = c.list_children(path).map_err(structural)?;
    if children.len() != count {
        return Err(Error::corruption(format!(
            "cell of shape {:?} has {} children",
            shape,
            children.len()
        )));
    }

    let mut slots: Vec<Option<&str>> = vec![None; count];
    for name in &children {
        let position = element_position(name)
            .filter(|&p| p < count)
            .ok_or_else(|| Error::corruption(format!("unexpected cell child '{}'", name)))?;
        if slots[position].replace(name.as_str()).is_some() {
            return Err(Error::corruption(format!(
                "cell element {} stored twice",
                position
            )));
        }
    }

    let mut column_major = Vec::with_capacity(count);
    for (position, name) in slots.into_iter().enumerate() {
        let name = name.ok_or_else(|| Error::corruption(format!("cell element {} missing", position)))?;
        column_major.push(read_node(c, &path.child(name)).map_err(|e| e.at_path(name))?);
    }

    Ok(CellArray::new(&shape, from_column_major(&shape, &column_major)))
}

/// Column-major position named by a cell child
fn element_position(name: &str) -> Option<usize> {
    if let Some(ordinal) = name.strip_prefix(LEGACY_ELEMENT_PREFIX) {
        return canonical_number(ordinal)
            .filter(|&n| n >= 1)
            .map(|n| n - 1);
    }
    canonical_number(name)
}

fn canonical_number(s: &str) -> Option<usize> {
    let n: usize = s.parse().ok()?;
    (n.to_string() == s).then_some(n)
}

/// Read the struct group at `path`
pub(crate) fn read_struct<C: Container>(
    c: &C,
    path: &NodePath,
    attrs: &AttrMap,
) -> Result<StructValue> {
    let names: Vec<&str> = attrs.require_text(FIELD_NAMES)?.split_whitespace().collect();

    let unique: BTreeSet<&str> = names.iter().copied().collect();
    if unique.len() != names.len() {
        return Err(Error::corruption("duplicate field in FieldNames"));
    }

    let children = c.list_children(path).map_err(structural)?;
    if children.len() != unique.len() || !unique.iter().all(|n| children.contains(*n)) {
        return Err(Error::corruption(format!(
            "FieldNames {:?} do not match stored fields {:?}",
            names, children
        )));
    }

    let mut value = StructValue::new();
    if let Some(class_name) = attrs.text(CLASS) {
        value = value.with_class(class_name);
    }
    for name in names {
        let field = read_node(c, &path.child(name)).map_err(|e| e.at_path(name))?;
        value.insert(name, field);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnsupportedPolicy;
    use crate::plan::Planner;
    use sdarc_core::{FormatVersion, OpaqueValue};
    use sdarc_storage::MemoryContainer;

    fn at() -> NodePath {
        NodePath::new(["rec"])
    }

    fn store(value: &Value) -> MemoryContainer {
        let planner = Planner::new(FormatVersion::V1_1, UnsupportedPolicy::Placeholder, None);
        let plan = planner.plan(value).unwrap();
        let mut c = MemoryContainer::new();
        write(&mut c, &at(), &plan, 0).unwrap();
        c
    }

    fn load(c: &MemoryContainer) -> Result<Value> {
        read_node(c, &at())
    }

    #[test]
    fn test_cell_children_are_column_major() {
        let value = Value::Cell(CellArray::new(
            [2, 2],
            vec![1.0.into(), "b".into(), true.into(), 4.0.into()],
        ));
        let c = store(&value);
        let children = c.list_children(&at()).unwrap();
        assert_eq!(children.len(), 4);
        // position 1 is row 1, column 0
        let second = c.read_attrs(&at().child("1")).unwrap();
        assert_eq!(second[RECORD_TYPE], AttrValue::from("logical"));
        assert_eq!(load(&c).unwrap(), value);
    }

    #[test]
    fn test_cell_with_many_elements_keeps_order() {
        let elements: Vec<Value> = (0..12).map(|i| Value::from(i as f64)).collect();
        let value = Value::Cell(CellArray::row(elements));
        assert_eq!(load(&store(&value)).unwrap(), value);
    }

    #[test]
    fn test_empty_composites() {
        let cell = Value::Cell(CellArray::new([0, 0], vec![]));
        let c = store(&cell);
        assert_eq!(c.read_attrs(&at()).unwrap()[EMPTY], AttrValue::from("yes"));
        assert_eq!(load(&c).unwrap(), cell);

        let s = Value::Struct(StructValue::new());
        assert_eq!(load(&store(&s)).unwrap(), s);
    }

    #[test]
    fn test_struct_field_order_and_class() {
        let value = Value::Struct(
            StructValue::new()
                .with_class("Point")
                .with_field("z", 3.0)
                .with_field("a", 1.0)
                .with_field("m", "mid"),
        );
        let c = store(&value);
        let attrs = c.read_attrs(&at()).unwrap();
        assert_eq!(attrs[FIELD_NAMES], AttrValue::from("z a m"));
        assert_eq!(attrs[CLASS], AttrValue::from("Point"));

        let back = load(&c).unwrap();
        assert_eq!(back, value);
        let names: Vec<&str> = back.as_struct().unwrap().field_names().collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_nested_struct_cell_struct() {
        let inner = StructValue::new().with_field("deep", vec![1.0, 2.0]);
        let value = Value::Struct(StructValue::new().with_field(
            "items",
            Value::Cell(CellArray::row(vec![inner.into(), "x".into()])),
        ));
        assert_eq!(load(&store(&value)).unwrap(), value);
    }

    #[test]
    fn test_placeholder_in_cell_reads_as_opaque() {
        let value = Value::Cell(CellArray::row(vec![
            1.0.into(),
            OpaqueValue::new("function_handle").into(),
        ]));
        let back = load(&store(&value)).unwrap();
        assert_eq!(back.as_cell().unwrap().elements()[1], value.as_cell().unwrap().elements()[1]);
    }

    #[test]
    fn test_legacy_element_names() {
        let mut c = MemoryContainer::new();
        c.create_group(&at()).unwrap();
        let mut attrs = AttrMap::new();
        attrs.insert(RECORD_TYPE.into(), AttrValue::from("cell"));
        attrs.insert(EMPTY.into(), AttrValue::flag(false));
        attrs.insert(RECORD_SIZE.into(), AttrValue::dims(&[1, 11]));
        c.write_attrs(&at(), &attrs).unwrap();

        let planner = Planner::new(FormatVersion::V1_1, UnsupportedPolicy::Placeholder, None);
        let values: Vec<Value> = (1..=11).map(|i| Value::from(i as f64)).collect();
        for (i, v) in values.iter().enumerate() {
            let plan = planner.plan(v).unwrap();
            write_node(&mut c, &at().child(format!("element {}", i + 1)), &plan, 0).unwrap();
        }

        // "element 10" sorts before "element 2" but lands at position 9
        assert_eq!(load(&c).unwrap(), Value::Cell(CellArray::row(values)));
    }

    #[test]
    fn test_cell_child_names() {
        assert_eq!(element_position("0"), Some(0));
        assert_eq!(element_position("12"), Some(12));
        assert_eq!(element_position("element 1"), Some(0));
        assert_eq!(element_position("element 0"), None);
        assert_eq!(element_position("007"), None);
        assert_eq!(element_position("+1"), None);
        assert_eq!(element_position("x"), None);
    }

    #[test]
    fn test_cell_gap_is_corruption() {
        let value = Value::Cell(CellArray::row(vec![1.0.into(), 2.0.into()]));
        let mut c = store(&value);
        let plan = Planner::new(FormatVersion::V1_1, UnsupportedPolicy::Placeholder, None)
            .plan(&value.as_cell().unwrap().elements()[1])
            .unwrap();
        c.remove_node(&at().child("1")).unwrap();
        write_node(&mut c, &at().child("5"), &plan, 0).unwrap();
        assert!(load(&c).unwrap_err().is_corruption());
    }

    #[test]
    fn test_cell_duplicate_position_is_corruption() {
        let value = Value::Cell(CellArray::row(vec![1.0.into(), 2.0.into()]));
        let mut c = store(&value);
        let plan = Planner::new(FormatVersion::V1_1, UnsupportedPolicy::Placeholder, None)
            .plan(&value.as_cell().unwrap().elements()[1])
            .unwrap();
        c.remove_node(&at().child("1")).unwrap();
        write_node(&mut c, &at().child("element 1"), &plan, 0).unwrap();
        assert!(load(&c).unwrap_err().is_corruption());
    }

    #[test]
    fn test_field_names_mismatch_is_corruption() {
        let value = Value::Struct(StructValue::new().with_field("a", 1.0).with_field("b", 2.0));
        let mut c = store(&value);
        let mut attrs = AttrMap::new();
        attrs.insert(FIELD_NAMES.into(), AttrValue::from("a c"));
        c.write_attrs(&at(), &attrs).unwrap();
        assert!(load(&c).unwrap_err().is_corruption());

        attrs.insert(FIELD_NAMES.into(), AttrValue::from("a a"));
        c.write_attrs(&at(), &attrs).unwrap();
        assert!(load(&c).unwrap_err().is_corruption());
    }

    #[test]
    fn test_struct_without_field_names_is_corruption() {
        let mut c = MemoryContainer::new();
        c.create_group(&at()).unwrap();
        let mut attrs = AttrMap::new();
        attrs.insert(RECORD_TYPE.into(), AttrValue::from("struct"));
        attrs.insert(EMPTY.into(), AttrValue::flag(true));
        c.write_attrs(&at(), &attrs).unwrap();
        assert!(load(&c).unwrap_err().is_corruption());

        // an empty list is still a list
        attrs.insert(FIELD_NAMES.into(), AttrValue::from(""));
        c.write_attrs(&at(), &attrs).unwrap();
        assert_eq!(load(&c).unwrap(), Value::Struct(StructValue::new()));
    }

    #[test]
    fn test_missing_cell_group_is_corruption() {
        let value = Value::Cell(CellArray::row(vec![1.0.into()]));
        let c = store(&value);
        let attrs = c.read_attrs(&at()).unwrap();
        let err = read_cell(&c, &NodePath::new(["gone"]), &attrs).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_nested_corruption_names_path() {
        let value = Value::Struct(StructValue::new().with_field("inner", vec![1.0, 2.0]));
        let mut c = store(&value);
        let mut attrs = AttrMap::new();
        attrs.insert(crate::envelope::DTYPE.into(), AttrValue::from("bogus"));
        c.write_attrs(&at().child("inner"), &attrs).unwrap();
        let err = load(&c).unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("inner"));
    }
}
