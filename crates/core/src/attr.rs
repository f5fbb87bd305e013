//! Attribute values attached to container nodes
//!
//! Attributes are the self-describing part of the archive: every record and
//! the archive root carry a small map of named values. Flags are stored as
//! the text `yes`/`no` so archives stay readable by tools that only know
//! strings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute map of a single node
pub type AttrMap = BTreeMap<String, AttrValue>;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Text value
    Text(String),
    /// Integer value
    Int(i64),
    /// Dimension list (shapes)
    Dims(Vec<u64>),
}

impl AttrValue {
    /// Encode a flag as `yes`/`no`
    pub fn flag(value: bool) -> Self {
        AttrValue::Text(if value { "yes" } else { "no" }.to_string())
    }

    /// Encode a shape
    pub fn dims(shape: &[usize]) -> Self {
        AttrValue::Dims(shape.iter().map(|&d| d as u64).collect())
    }

    /// Get as &str if this is a Text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a flag if this is `yes` or `no`
    pub fn as_flag(&self) -> Option<bool> {
        match self.as_text() {
            Some("yes") => Some(true),
            Some("no") => Some(false),
            _ => None,
        }
    }

    /// Get as a shape if this is a Dims value that fits in `usize`
    pub fn as_shape(&self) -> Option<Vec<usize>> {
        match self {
            AttrValue::Dims(dims) => dims.iter().map(|&d| usize::try_from(d).ok()).collect(),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Dims(d) => {
                let parts: Vec<String> = d.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

/// Typed accessors over an attribute map.
///
/// The `require_*` methods report a missing or mistyped attribute as
/// `StructuralCorruption`, since every caller is reading persisted data.
pub trait AttrMapExt {
    /// Text attribute, if present and textual
    fn text(&self, name: &str) -> Option<&str>;
    /// Required text attribute
    fn require_text(&self, name: &str) -> Result<&str>;
    /// Required `yes`/`no` flag
    fn require_flag(&self, name: &str) -> Result<bool>;
    /// Optional `yes`/`no` flag (missing means `false`)
    fn flag_or_false(&self, name: &str) -> Result<bool>;
    /// Required integer attribute
    fn require_int(&self, name: &str) -> Result<i64>;
    /// Required shape attribute
    fn require_shape(&self, name: &str) -> Result<Vec<usize>>;
}

impl AttrMapExt for AttrMap {
    fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_text)
    }

    fn require_text(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(value) => value
                .as_text()
                .ok_or_else(|| Error::corruption(format!("attribute '{}' is not text", name))),
            None => Err(missing(name)),
        }
    }

    fn require_flag(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Some(value) => value.as_flag().ok_or_else(|| {
                Error::corruption(format!("attribute '{}' must be 'yes' or 'no', got '{}'", name, value))
            }),
            None => Err(missing(name)),
        }
    }

    fn flag_or_false(&self, name: &str) -> Result<bool> {
        if self.contains_key(name) {
            self.require_flag(name)
        } else {
            Ok(false)
        }
    }

    fn require_int(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            Some(value) => value
                .as_int()
                .ok_or_else(|| Error::corruption(format!("attribute '{}' is not an integer", name))),
            None => Err(missing(name)),
        }
    }

    fn require_shape(&self, name: &str) -> Result<Vec<usize>> {
        match self.get(name) {
            Some(value) => value
                .as_shape()
                .ok_or_else(|| Error::corruption(format!("attribute '{}' is not a shape", name))),
            None => Err(missing(name)),
        }
    }
}

fn missing(name: &str) -> Error {
    Error::corruption(format!("missing required attribute '{}'", name))
}
