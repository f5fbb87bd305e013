//! Sparse payload codec
//!
//! A sparse matrix is a group with three datasets: `row` and `col` hold
//! 1-based `u64` coordinates, `value` holds `f64` values (complex values as
//! all real parts then all imaginary parts). Entries are written in
//! canonical order, row then column.

use super::array::{join_complex, split_complex};
use super::structural;
use crate::envelope::{ARRAY_SIZE, COMPLEX, DTYPE, EMPTY, RECORD_TYPE, SPARSE};
use byteorder::{ByteOrder, LittleEndian};
use sdarc_core::{
    AttrMap, AttrMapExt, AttrValue, Dtype, Error, RecordKind, Result, SparseMatrix, SparseValues,
};
use sdarc_storage::{Container, NodePath};

/// Row coordinate dataset
pub const ROW: &str = "row";
/// Column coordinate dataset
pub const COL: &str = "col";
/// Value dataset
pub const VALUE: &str = "value";

/// Write `matrix` as a group at `path`
pub(crate) fn write<C: Container>(
    c: &mut C,
    path: &NodePath,
    matrix: &SparseMatrix,
    level: u8,
) -> Result<()> {
    let matrix = matrix.to_canonical();
    let nnz = matrix.nnz();

    c.create_group(path)?;
    c.write_attrs(path, &group_attrs(&matrix))?;

    let rows: Vec<u64> = matrix.row_indices().iter().map(|&r| r as u64 + 1).collect();
    let cols: Vec<u64> = matrix.col_indices().iter().map(|&c| c as u64 + 1).collect();
    c.write_buffer(&path.child(ROW), &u64_bytes(&rows), &[nnz, 1], level)?;
    c.write_buffer(&path.child(COL), &u64_bytes(&cols), &[nnz, 1], level)?;

    let (values, shape) = match matrix.values() {
        SparseValues::Real(v) => (v.clone(), vec![nnz, 1]),
        SparseValues::Complex(v) => (split_complex(v), vec![nnz, 2]),
    };
    let mut buf = vec![0u8; values.len() * 8];
    LittleEndian::write_f64_into(&values, &mut buf);
    c.write_buffer(&path.child(VALUE), &buf, &shape, level)?;
    Ok(())
}

fn group_attrs(matrix: &SparseMatrix) -> AttrMap {
    let mut attrs = AttrMap::new();
    attrs.insert(RECORD_TYPE.into(), AttrValue::from(RecordKind::Sparse.tag()));
    attrs.insert(SPARSE.into(), AttrValue::flag(true));
    attrs.insert(COMPLEX.into(), AttrValue::flag(matrix.is_complex()));
    attrs.insert(
        EMPTY.into(),
        AttrValue::flag(matrix.rows() == 0 || matrix.cols() == 0),
    );
    attrs.insert(ARRAY_SIZE.into(), AttrValue::dims(&matrix.shape()));
    attrs.insert(DTYPE.into(), AttrValue::from(Dtype::Float64.name()));
    attrs
}

fn u64_bytes(values: &[u64]) -> Vec<u8> {
    let mut buf = vec![0u8; values.len() * 8];
    LittleEndian::write_u64_into(values, &mut buf);
    buf
}

/// Read the sparse group at `path`
pub(crate) fn read<C: Container>(c: &C, path: &NodePath) -> Result<SparseMatrix> {
    let attrs = c.read_attrs(path).map_err(structural)?;
    let shape = attrs.require_shape(ARRAY_SIZE)?;
    let (rows, cols) = match shape.as_slice() {
        [rows, cols] => (*rows, *cols),
        other => {
            return Err(Error::corruption(format!(
                "sparse shape must be two-dimensional, got {:?}",
                other
            )))
        }
    };
    let complex = attrs.flag_or_false(COMPLEX)?;

    let row_indices = read_indices(c, &path.child(ROW), rows)?;
    let col_indices = read_indices(c, &path.child(COL), cols)?;
    if row_indices.len() != col_indices.len() {
        return Err(Error::corruption(format!(
            "sparse data has {} row and {} column indices",
            row_indices.len(),
            col_indices.len()
        )));
    }

    let (bytes, _) = c.read_buffer(&path.child(VALUE)).map_err(structural)?;
    let nnz = row_indices.len();
    let expected = if complex { nnz * 16 } else { nnz * 8 };
    if bytes.len() != expected {
        return Err(Error::corruption(format!(
            "sparse value buffer has {} bytes, {} entries need {}",
            bytes.len(),
            nnz,
            expected
        )));
    }
    let mut parts = vec![0f64; bytes.len() / 8];
    LittleEndian::read_f64_into(&bytes, &mut parts);
    let values = if complex {
        SparseValues::Complex(join_complex(&parts))
    } else {
        SparseValues::Real(parts)
    };

    let matrix = SparseMatrix::from_parts(rows, cols, row_indices, col_indices, values);
    if let Some((row, col)) = matrix.find_duplicate() {
        return Err(Error::corruption(format!(
            "sparse entry ({}, {}) stored twice",
            row + 1,
            col + 1
        )));
    }
    Ok(matrix.to_canonical())
}

/// 1-based indices on disk, 0-based in memory
fn read_indices<C: Container>(c: &C, path: &NodePath, bound: usize) -> Result<Vec<usize>> {
    let (bytes, _) = c.read_buffer(path).map_err(structural)?;
    if bytes.len() % 8 != 0 {
        return Err(Error::corruption(format!(
            "{}: index buffer length {} is not a multiple of 8",
            path,
            bytes.len()
        )));
    }
    let mut raw = vec![0u64; bytes.len() / 8];
    LittleEndian::read_u64_into(&bytes, &mut raw);
    raw.into_iter()
        .map(|i| match usize::try_from(i) {
            Ok(i) if i >= 1 && i <= bound => Ok(i - 1),
            _ => Err(Error::corruption(format!(
                "{}: index {} outside 1..={}",
                path, i, bound
            ))),
        })
        .collect()
}
