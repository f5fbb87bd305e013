//! Record kinds and archive format versions
//!
//! Every persisted record carries a kind tag that tells a reader how to
//! reconstruct it. The archive carries a format version that decides which
//! kinds may be written into it.
//!
//! | Kind | Tag | Introduced |
//! |------|-----|------------|
//! | Numeric | `numeric` | 1.0 |
//! | Character | `character` | 1.0 |
//! | Logical | `logical` | 1.0 |
//! | Sparse | `numeric` + `Sparse=yes` | 1.0 |
//! | Cell | `cell` | 1.0 |
//! | Struct | `structure` | 1.0 |
//! | File | `file` | 1.1 |
//! | Unsupported | `unsupported` | 1.0 |

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of semantic categories a value is persisted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Real or complex numeric array (scalars are 1x1 arrays)
    Numeric,
    /// Text
    Character,
    /// Boolean array
    Logical,
    /// Sparse numeric matrix
    Sparse,
    /// Ordered, heterogeneous, positionally indexed collection
    Cell,
    /// Field-keyed record whose fields are full records
    Struct,
    /// Raw byte payload
    File,
    /// Placeholder for a value with no safe encoding
    Unsupported,
}

impl RecordKind {
    /// All record kinds (for iteration)
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Numeric,
        RecordKind::Character,
        RecordKind::Logical,
        RecordKind::Sparse,
        RecordKind::Cell,
        RecordKind::Struct,
        RecordKind::File,
        RecordKind::Unsupported,
    ];

    /// Tag persisted in the `RecordType` attribute
    ///
    /// `Sparse` shares the `numeric` tag; the `Sparse` attribute tells them apart.
    pub const fn tag(&self) -> &'static str {
        match self {
            RecordKind::Numeric | RecordKind::Sparse => "numeric",
            RecordKind::Character => "character",
            RecordKind::Logical => "logical",
            RecordKind::Cell => "cell",
            RecordKind::Struct => "structure",
            RecordKind::File => "file",
            RecordKind::Unsupported => "unsupported",
        }
    }

    /// Human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            RecordKind::Numeric => "numeric",
            RecordKind::Character => "character",
            RecordKind::Logical => "logical",
            RecordKind::Sparse => "sparse",
            RecordKind::Cell => "cell",
            RecordKind::Struct => "structure",
            RecordKind::File => "file",
            RecordKind::Unsupported => "unsupported",
        }
    }

    /// Resolve a persisted tag into a kind.
    ///
    /// Reading is lenient: archives written by other tools contain object,
    /// object-array and struct-array records, which read back as their
    /// struct/cell equivalents, and function handles or unknown tags read
    /// back as `Unsupported` so the rest of the archive stays enumerable.
    pub fn from_tag(tag: &str, sparse: bool) -> RecordKind {
        match tag {
            "numeric" if sparse => RecordKind::Sparse,
            "numeric" => RecordKind::Numeric,
            "character" => RecordKind::Character,
            "logical" => RecordKind::Logical,
            "cell" | "structures" | "objects" => RecordKind::Cell,
            "structure" | "object" => RecordKind::Struct,
            "file" => RecordKind::File,
            _ => RecordKind::Unsupported,
        }
    }

    /// Check if records of this kind hold child records
    pub const fn is_composite(&self) -> bool {
        matches!(self, RecordKind::Cell | RecordKind::Struct)
    }

    /// First format version able to store this kind
    pub const fn introduced_in(&self) -> FormatVersion {
        match self {
            RecordKind::File => FormatVersion::V1_1,
            _ => FormatVersion::V1_0,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Archive format revision
///
/// Fixed when an archive is initialized and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Original revision: identifier-like labels, no file records
    #[serde(rename = "1.0")]
    V1_0,
    /// Relaxed labels and file records
    #[serde(rename = "1.1")]
    V1_1,
}

impl FormatVersion {
    /// Version written when none is requested
    pub const LATEST: FormatVersion = FormatVersion::V1_1;

    /// Version string persisted in the header
    pub const fn as_str(&self) -> &'static str {
        match self {
            FormatVersion::V1_0 => "1.0",
            FormatVersion::V1_1 => "1.1",
        }
    }

    /// Parse a persisted version string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1.0" => Some(FormatVersion::V1_0),
            "1.1" => Some(FormatVersion::V1_1),
            _ => None,
        }
    }

    /// Check if records of `kind` may be written at this version
    pub fn supports(&self, kind: RecordKind) -> bool {
        kind.introduced_in() <= *self
    }

    /// Check if labels must be identifier-like at this version
    pub const fn requires_identifier_labels(&self) -> bool {
        matches!(self, FormatVersion::V1_0)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        FormatVersion::LATEST
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
