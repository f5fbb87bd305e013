//! Write planning
//!
//! Before anything touches the container, the whole value tree is
//! classified and checked: field names, version gating, nesting depth and
//! the unsupported-value policy. The result is a plan the codecs only have
//! to walk, so a rejected value never leaves partial writes behind.

use crate::classify::{classify, Classification, ClassifyError};
use crate::config::UnsupportedPolicy;
use sdarc_core::{validate_field_name, Error, FormatVersion, RecordKind, Result, Value};
use tracing::debug;

/// One node of a write plan
#[derive(Debug)]
pub(crate) enum Planned<'a> {
    /// Numeric, character, logical, sparse or file payload
    Leaf {
        info: Classification,
        value: &'a Value,
    },
    /// Cell with planned elements in row-major order
    Cell {
        info: Classification,
        elements: Vec<Planned<'a>>,
    },
    /// Struct with planned fields in order
    Struct {
        info: Classification,
        fields: Vec<(&'a str, Planned<'a>)>,
    },
    /// Stand-in for a value with no safe encoding
    Placeholder { info: Classification },
}

impl Planned<'_> {
    pub(crate) fn info(&self) -> &Classification {
        match self {
            Planned::Leaf { info, .. }
            | Planned::Cell { info, .. }
            | Planned::Struct { info, .. }
            | Planned::Placeholder { info } => info,
        }
    }

    pub(crate) fn kind(&self) -> RecordKind {
        self.info().kind
    }
}

/// Where a planned value sits, which decides what `Drop` means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    TopLevel,
    CellElement,
    StructField,
}

/// Builds write plans for one archive
#[derive(Debug, Clone, Copy)]
pub(crate) struct Planner {
    version: FormatVersion,
    policy: UnsupportedPolicy,
    max_depth: Option<usize>,
}

impl Planner {
    pub(crate) fn new(
        version: FormatVersion,
        policy: UnsupportedPolicy,
        max_depth: Option<usize>,
    ) -> Self {
        Planner {
            version,
            policy,
            max_depth,
        }
    }

    /// Plan a top-level record
    pub(crate) fn plan<'a>(&self, value: &'a Value) -> Result<Planned<'a>> {
        // top-level Drop has nowhere to drop to; plan_slot treats it as Reject
        match self.plan_slot(value, 0, Slot::TopLevel)? {
            Some(planned) => Ok(planned),
            None => Err(Error::UnsupportedValue(
                "top-level value has no archive encoding".to_string(),
            )),
        }
    }

    fn plan_slot<'a>(&self, value: &'a Value, depth: usize, slot: Slot) -> Result<Option<Planned<'a>>> {
        if let Some(max) = self.max_depth {
            if depth > max {
                return Err(Error::UnsupportedValue(format!(
                    "value nesting exceeds the maximum depth of {}",
                    max
                )));
            }
        }

        let info = match classify(value) {
            Ok(info) => info,
            Err(e) => return self.unclassifiable(value, e, slot),
        };

        if !self.version.supports(info.kind) {
            return Err(Error::VersionIncompatible {
                kind: info.kind,
                required: info.kind.introduced_in(),
                actual: self.version,
            });
        }

        let planned = match value {
            Value::Cell(cell) => {
                let mut elements = Vec::with_capacity(cell.len());
                for element in cell.elements() {
                    match self.plan_slot(element, depth + 1, Slot::CellElement)? {
                        Some(planned) => elements.push(planned),
                        None => elements.push(Planned::Placeholder {
                            info: Classification::unsupported(element.type_name()),
                        }),
                    }
                }
                Planned::Cell { info, elements }
            }
            Value::Struct(s) => {
                let mut fields = Vec::with_capacity(s.len());
                for (name, field) in s.fields() {
                    validate_field_name(name).map_err(|e| Error::label_invalid(name.as_str(), e))?;
                    if let Some(planned) = self.plan_slot(field, depth + 1, Slot::StructField)? {
                        fields.push((name.as_str(), planned));
                    }
                }
                let mut info = info;
                info.is_empty = fields.is_empty();
                Planned::Struct { info, fields }
            }
            _ => Planned::Leaf { info, value },
        };
        Ok(Some(planned))
    }

    fn unclassifiable<'a>(
        &self,
        value: &'a Value,
        reason: ClassifyError,
        slot: Slot,
    ) -> Result<Option<Planned<'a>>> {
        let class_name = match (&reason, value) {
            (ClassifyError::Opaque(class_name), _) => class_name.clone(),
            (_, value) => value.type_name().to_lowercase(),
        };

        match (self.policy, slot) {
            (UnsupportedPolicy::Placeholder, _) => {
                debug!(class = %class_name, reason = %reason, "storing placeholder");
                Ok(Some(Planned::Placeholder {
                    info: Classification::unsupported(class_name),
                }))
            }
            (UnsupportedPolicy::Drop, Slot::StructField) => {
                debug!(class = %class_name, reason = %reason, "dropping field");
                Ok(None)
            }
            (UnsupportedPolicy::Drop, Slot::CellElement) => Ok(Some(Planned::Placeholder {
                info: Classification::unsupported(class_name),
            })),
            (UnsupportedPolicy::Drop, Slot::TopLevel) | (UnsupportedPolicy::Reject, _) => {
                Err(Error::UnsupportedValue(reason.to_string()))
            }
        }
    }
}
