//! Value classification
//!
//! Maps an in-memory value onto the record kind it is persisted as, along
//! with the normalized metadata every record carries. Classification does
//! no I/O and does not recurse: composite children are classified by the
//! planner as it walks the tree.

use sdarc_core::{element_count, RecordKind, Shape, SparseMatrix, Value};

/// Result of classifying a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Record kind the value is stored as
    pub kind: RecordKind,
    /// Normalized shape (at least two dimensions)
    pub shape: Shape,
    /// True when the value holds no elements
    pub is_empty: bool,
    /// True for complex numeric data
    pub is_complex: bool,
    /// Reconstruction hint for struct-like values
    pub class_name: Option<String>,
}

impl Classification {
    fn new(kind: RecordKind, shape: &[usize], count: usize) -> Self {
        Classification {
            kind,
            shape: shape.to_vec(),
            is_empty: count == 0,
            is_complex: false,
            class_name: None,
        }
    }

    /// Metadata of the placeholder that stands in for an unclassifiable value
    pub fn unsupported(class_name: impl Into<String>) -> Self {
        Classification {
            kind: RecordKind::Unsupported,
            shape: vec![0, 0],
            is_empty: true,
            is_complex: false,
            class_name: Some(class_name.into()),
        }
    }
}

/// Why a value cannot be classified
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// Value has no archive encoding
    #[error("value of class '{0}' has no archive encoding")]
    Opaque(String),

    /// Element count does not match the shape
    #[error("{kind} data has {len} elements but shape {shape:?} needs {expected}")]
    ShapeMismatch {
        /// Kind the value would have been stored as
        kind: RecordKind,
        /// Declared shape
        shape: Shape,
        /// Elements implied by the shape
        expected: usize,
        /// Elements present
        len: usize,
    },

    /// Product of the dimensions does not fit in memory
    #[error("shape {0:?} overflows")]
    ShapeOverflow(Shape),

    /// Sparse index and value sequences have different lengths
    #[error("sparse matrix has {rows} row indices, {cols} column indices and {values} values")]
    SparseLengthMismatch {
        /// Row index count
        rows: usize,
        /// Column index count
        cols: usize,
        /// Value count
        values: usize,
    },

    /// Sparse entry lies outside the matrix
    #[error("sparse entry ({row}, {col}) is outside a {rows}x{cols} matrix")]
    SparseOutOfBounds {
        /// Entry row
        row: usize,
        /// Entry column
        col: usize,
        /// Matrix rows
        rows: usize,
        /// Matrix columns
        cols: usize,
    },

    /// Sparse coordinate stored twice
    #[error("sparse entry ({row}, {col}) is stored more than once")]
    SparseDuplicate {
        /// Entry row
        row: usize,
        /// Entry column
        col: usize,
    },
}

/// Classify a value.
///
/// Decision order: sparse, textual, boolean, ordered collection, field-keyed
/// mapping, numeric, raw bytes. Opaque values and values whose data
/// disagrees with their shape fail classification; the caller's policy
/// decides whether that becomes a placeholder or an error.
pub fn classify(value: &Value) -> Result<Classification, ClassifyError> {
    match value {
        Value::Sparse(s) => classify_sparse(s),
        Value::Character(c) => {
            let count = checked_count(RecordKind::Character, c.shape(), c.char_count())?;
            Ok(Classification::new(RecordKind::Character, c.shape(), count))
        }
        Value::Logical(a) => {
            let count = checked_count(RecordKind::Logical, a.shape(), a.data().len())?;
            Ok(Classification::new(RecordKind::Logical, a.shape(), count))
        }
        Value::Cell(c) => {
            let count = checked_count(RecordKind::Cell, c.shape(), c.len())?;
            Ok(Classification::new(RecordKind::Cell, c.shape(), count))
        }
        Value::Struct(s) => {
            let mut info = Classification::new(RecordKind::Struct, &[1, 1], s.len());
            info.class_name = s.class_name().map(str::to_string);
            Ok(info)
        }
        Value::Numeric(a) => {
            let count = checked_count(RecordKind::Numeric, a.shape(), a.data().len())?;
            let mut info = Classification::new(RecordKind::Numeric, a.shape(), count);
            info.is_complex = a.is_complex();
            Ok(info)
        }
        Value::File(bytes) => Ok(Classification::new(
            RecordKind::File,
            &[1, bytes.len()],
            bytes.len(),
        )),
        Value::Opaque(o) => Err(ClassifyError::Opaque(o.class_name.clone())),
    }
}

fn checked_count(kind: RecordKind, shape: &[usize], len: usize) -> Result<usize, ClassifyError> {
    let expected =
        element_count(shape).ok_or_else(|| ClassifyError::ShapeOverflow(shape.to_vec()))?;
    if expected != len {
        return Err(ClassifyError::ShapeMismatch {
            kind,
            shape: shape.to_vec(),
            expected,
            len,
        });
    }
    Ok(expected)
}

fn classify_sparse(s: &SparseMatrix) -> Result<Classification, ClassifyError> {
    let (rows, cols) = (s.rows(), s.cols());
    let count = rows
        .checked_mul(cols)
        .ok_or_else(|| ClassifyError::ShapeOverflow(s.shape()))?;

    let (nr, nc, nv) = (s.row_indices().len(), s.col_indices().len(), s.nnz());
    if nr != nv || nc != nv {
        return Err(ClassifyError::SparseLengthMismatch {
            rows: nr,
            cols: nc,
            values: nv,
        });
    }

    for (&row, &col) in s.row_indices().iter().zip(s.col_indices()) {
        if row >= rows || col >= cols {
            return Err(ClassifyError::SparseOutOfBounds {
                row,
                col,
                rows,
                cols,
            });
        }
    }

    if let Some((row, col)) = s.find_duplicate() {
        return Err(ClassifyError::SparseDuplicate { row, col });
    }

    let mut info = Classification::new(RecordKind::Sparse, &[rows, cols], count);
    info.is_complex = s.is_complex();
    Ok(info)
}
