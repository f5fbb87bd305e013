//! Element ordering between memory and disk
//!
//! Values are row-major in memory (last index varies fastest). Buffers are
//! column-major on disk (first index varies fastest). This module is the
//! only place the two orders meet; every codec goes through it.
//!
//! Callers guarantee that the data length equals the shape's element
//! count. Encoders get that from classification, decoders check it against
//! the stored shape before converting.

/// Row-major linear index of each element, listed in column-major order
pub fn column_major_order(shape: &[usize]) -> Vec<usize> {
    let total: usize = shape.iter().product();
    if total == 0 {
        return Vec::new();
    }

    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }

    let mut order = Vec::with_capacity(total);
    let mut index = vec![0usize; shape.len()];
    for _ in 0..total {
        order.push(index.iter().zip(&strides).map(|(i, s)| i * s).sum());
        // first dimension varies fastest
        for (dim, &extent) in index.iter_mut().zip(shape) {
            *dim += 1;
            if *dim < extent {
                break;
            }
            *dim = 0;
        }
    }
    order
}

/// Reorder row-major data into column-major order
pub fn to_column_major<T: Clone>(shape: &[usize], data: &[T]) -> Vec<T> {
    column_major_order(shape)
        .into_iter()
        .map(|i| data[i].clone())
        .collect()
}

/// Reorder column-major data into row-major order
pub fn from_column_major<T: Clone>(shape: &[usize], data: &[T]) -> Vec<T> {
    let order = column_major_order(shape);
    let mut inverse = vec![0usize; order.len()];
    for (position, &row_major) in order.iter().enumerate() {
        inverse[row_major] = position;
    }
    inverse.into_iter().map(|k| data[k].clone()).collect()
}
