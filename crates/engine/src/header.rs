//! Archive header
//!
//! The root group's attributes identify the archive and record its
//! lifecycle:
//!
//! | Attribute | Value |
//! |-----------|-------|
//! | `FileFormat` | always `SDA` |
//! | `FormatVersion` | `1.0` or `1.1` |
//! | `Writable` | `yes` / `no` |
//! | `Created` | `DD-Mon-YYYY HH:MM:SS` |
//! | `Updated` | `DD-Mon-YYYY HH:MM:SS` |
//!
//! Timestamps at exactly midnight are written as the date alone; both
//! forms are accepted on read.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use sdarc_core::{AttrMap, AttrMapExt, AttrValue, Error, FormatVersion, Result};

/// Archive identifier attribute
pub const FILE_FORMAT: &str = "FileFormat";
/// Format version attribute
pub const FORMAT_VERSION: &str = "FormatVersion";
/// Writability attribute
pub const WRITABLE: &str = "Writable";
/// Creation timestamp attribute
pub const CREATED: &str = "Created";
/// Last-mutation timestamp attribute
pub const UPDATED: &str = "Updated";

/// Value of the `FileFormat` attribute
pub const FILE_FORMAT_TAG: &str = "SDA";

const DATETIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S";
const DATE_FORMAT: &str = "%d-%b-%Y";

/// Archive-level metadata held on the root group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Format version, fixed at creation
    pub format_version: FormatVersion,
    /// False once the archive has been locked
    pub writable: bool,
    /// Creation time
    pub created: NaiveDateTime,
    /// Time of the last mutating operation
    pub updated: NaiveDateTime,
}

impl ArchiveHeader {
    /// Header of a newly created archive
    pub fn new(format_version: FormatVersion, now: NaiveDateTime) -> Self {
        let now = truncate_subsec(now);
        ArchiveHeader {
            format_version,
            writable: true,
            created: now,
            updated: now,
        }
    }

    /// Copy with `updated` set to `now`
    pub fn touched(&self, now: NaiveDateTime) -> Self {
        ArchiveHeader {
            updated: truncate_subsec(now),
            ..self.clone()
        }
    }

    /// Copy that is permanently read-only
    pub fn locked(&self, now: NaiveDateTime) -> Self {
        ArchiveHeader {
            writable: false,
            ..self.touched(now)
        }
    }

    /// Root attributes for this header
    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert(FILE_FORMAT.into(), AttrValue::from(FILE_FORMAT_TAG));
        attrs.insert(
            FORMAT_VERSION.into(),
            AttrValue::from(self.format_version.as_str()),
        );
        attrs.insert(WRITABLE.into(), AttrValue::flag(self.writable));
        attrs.insert(CREATED.into(), AttrValue::from(format_timestamp(&self.created)));
        attrs.insert(UPDATED.into(), AttrValue::from(format_timestamp(&self.updated)));
        attrs
    }

    /// Parse and validate root attributes
    pub fn from_attrs(attrs: &AttrMap) -> Result<Self> {
        let format = attrs.require_text(FILE_FORMAT)?;
        if format != FILE_FORMAT_TAG {
            return Err(Error::corruption(format!(
                "file format '{}' is not {}",
                format, FILE_FORMAT_TAG
            )));
        }

        let version = attrs.require_text(FORMAT_VERSION)?;
        let format_version = FormatVersion::parse(version).ok_or_else(|| {
            Error::corruption(format!("unsupported format version '{}'", version))
        })?;

        Ok(ArchiveHeader {
            format_version,
            writable: attrs.require_flag(WRITABLE)?,
            created: require_timestamp(attrs, CREATED)?,
            updated: require_timestamp(attrs, UPDATED)?,
        })
    }
}

/// Current local time at second resolution
pub fn now() -> NaiveDateTime {
    truncate_subsec(chrono::Local::now().naive_local())
}

fn truncate_subsec(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Format a timestamp the way the header stores it
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    if t.time() == NaiveTime::MIN {
        t.format(DATE_FORMAT).to_string()
    } else {
        t.format(DATETIME_FORMAT).to_string()
    }
}

/// Parse a header timestamp (`DD-Mon-YYYY[ HH:MM:SS]`)
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn require_timestamp(attrs: &AttrMap, name: &str) -> Result<NaiveDateTime> {
    let text = attrs.require_text(name)?;
    parse_timestamp(text)
        .ok_or_else(|| Error::corruption(format!("attribute '{}' is not a timestamp: '{}'", name, text)))
}
