//! Record envelopes
//!
//! Every top-level record is a group whose attributes describe it without
//! reading its payload. This module names every attribute the archive
//! writes and converts the envelope to and from an attribute map.

use sdarc_core::{
    is_valid_deflate, AttrMap, AttrMapExt, AttrValue, Error, RecordKind, Result,
};

/// Kind tag of a record or payload node
pub const RECORD_TYPE: &str = "RecordType";
/// Free-text record description
pub const DESCRIPTION: &str = "Description";
/// Deflate level the record was written with
pub const DEFLATE: &str = "Deflate";
/// `yes` when the value holds no elements
pub const EMPTY: &str = "Empty";
/// `yes` for complex numeric data
pub const COMPLEX: &str = "Complex";
/// `yes` for sparse numeric data
pub const SPARSE: &str = "Sparse";
/// Class-name reconstruction hint
pub const CLASS: &str = "Class";
/// Shape of an array payload
pub const ARRAY_SIZE: &str = "ArraySize";
/// Shape of a cell
pub const RECORD_SIZE: &str = "RecordSize";
/// Space-separated struct field order
pub const FIELD_NAMES: &str = "FieldNames";
/// Element type of a numeric payload
pub const DTYPE: &str = "Dtype";
/// Text encoding of a character payload
pub const ENCODING: &str = "Encoding";

/// Attribute set carried by every top-level record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEnvelope {
    /// Resolved record kind
    pub kind: RecordKind,
    /// Persisted kind tag (may be a foreign tag for `Unsupported`)
    pub tag: String,
    /// Free-text description
    pub description: String,
    /// Deflate level
    pub deflate: u8,
    /// Value held no elements
    pub is_empty: bool,
    /// Complex numeric data
    pub is_complex: bool,
    /// Reconstruction hint
    pub class_name: Option<String>,
}

impl RecordEnvelope {
    /// Envelope for a freshly written record
    pub fn new(kind: RecordKind, description: impl Into<String>, deflate: u8) -> Self {
        RecordEnvelope {
            kind,
            tag: kind.tag().to_string(),
            description: description.into(),
            deflate,
            is_empty: false,
            is_complex: false,
            class_name: None,
        }
    }

    /// True for sparse records
    pub fn is_sparse(&self) -> bool {
        self.kind == RecordKind::Sparse
    }

    /// Attributes to write on the record group
    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert(RECORD_TYPE.into(), AttrValue::from(self.tag.as_str()));
        attrs.insert(DESCRIPTION.into(), AttrValue::from(self.description.as_str()));
        attrs.insert(DEFLATE.into(), AttrValue::Int(i64::from(self.deflate)));
        attrs.insert(EMPTY.into(), AttrValue::flag(self.is_empty));
        if matches!(self.kind, RecordKind::Numeric | RecordKind::Sparse) {
            attrs.insert(COMPLEX.into(), AttrValue::flag(self.is_complex));
            attrs.insert(SPARSE.into(), AttrValue::flag(self.is_sparse()));
        }
        if let Some(class_name) = &self.class_name {
            attrs.insert(CLASS.into(), AttrValue::from(class_name.as_str()));
        }
        attrs
    }

    /// Parse the attributes of a record group
    pub fn from_attrs(attrs: &AttrMap) -> Result<Self> {
        let tag = attrs.require_text(RECORD_TYPE)?.to_string();
        let kind = RecordKind::from_tag(&tag, attrs.flag_or_false(SPARSE)?);

        let deflate = attrs.require_int(DEFLATE)?;
        let deflate = u8::try_from(deflate)
            .ok()
            .filter(|&d| is_valid_deflate(d))
            .ok_or_else(|| Error::corruption(format!("deflate level {} out of range", deflate)))?;

        Ok(RecordEnvelope {
            kind,
            tag,
            description: attrs.text(DESCRIPTION).unwrap_or_default().to_string(),
            deflate,
            is_empty: attrs.require_flag(EMPTY)?,
            is_complex: attrs.flag_or_false(COMPLEX)?,
            class_name: attrs.text(CLASS).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_envelope() {
        let mut env = RecordEnvelope::new(RecordKind::Numeric, "a matrix", 4);
        env.is_empty = true;
        let attrs = env.to_attrs();
        assert_eq!(attrs[RECORD_TYPE], AttrValue::from("numeric"));
        assert_eq!(attrs[DEFLATE], AttrValue::Int(4));
        assert_eq!(attrs[EMPTY], AttrValue::from("yes"));
        assert_eq!(attrs[COMPLEX], AttrValue::from("no"));
        assert_eq!(attrs[SPARSE], AttrValue::from("no"));
        assert!(!attrs.contains_key(CLASS));
        assert_eq!(RecordEnvelope::from_attrs(&attrs).unwrap(), env);
    }

    #[test]
    fn test_sparse_envelope() {
        let env = RecordEnvelope::new(RecordKind::Sparse, "", 0);
        let attrs = env.to_attrs();
        assert_eq!(attrs[RECORD_TYPE], AttrValue::from("numeric"));
        assert_eq!(attrs[SPARSE], AttrValue::from("yes"));
        assert_eq!(RecordEnvelope::from_attrs(&attrs).unwrap().kind, RecordKind::Sparse);
    }

    #[test]
    fn test_struct_envelope_has_no_numeric_flags() {
        let mut env = RecordEnvelope::new(RecordKind::Struct, "", 0);
        env.class_name = Some("Point".to_string());
        let attrs = env.to_attrs();
        assert!(!attrs.contains_key(COMPLEX));
        assert_eq!(attrs[CLASS], AttrValue::from("Point"));
    }

    #[test]
    fn test_foreign_tag() {
        let mut attrs = RecordEnvelope::new(RecordKind::Numeric, "", 0).to_attrs();
        attrs.insert(RECORD_TYPE.into(), AttrValue::from("function"));
        let env = RecordEnvelope::from_attrs(&attrs).unwrap();
        assert_eq!(env.kind, RecordKind::Unsupported);
        assert_eq!(env.tag, "function");
    }

    #[test]
    fn test_missing_description_reads_empty() {
        let mut attrs = RecordEnvelope::new(RecordKind::Logical, "x", 0).to_attrs();
        attrs.remove(DESCRIPTION);
        assert_eq!(RecordEnvelope::from_attrs(&attrs).unwrap().description, "");
    }

    #[test]
    fn test_bad_deflate_is_corruption() {
        let mut attrs = RecordEnvelope::new(RecordKind::Logical, "", 0).to_attrs();
        attrs.insert(DEFLATE.into(), AttrValue::Int(12));
        assert!(RecordEnvelope::from_attrs(&attrs).unwrap_err().is_corruption());

        attrs.insert(DEFLATE.into(), AttrValue::Int(-1));
        assert!(RecordEnvelope::from_attrs(&attrs).unwrap_err().is_corruption());
    }

    #[test]
    fn test_missing_required_is_corruption() {
        let mut attrs = RecordEnvelope::new(RecordKind::Cell, "", 0).to_attrs();
        attrs.remove(EMPTY);
        assert!(RecordEnvelope::from_attrs(&attrs).unwrap_err().is_corruption());
    }
}
