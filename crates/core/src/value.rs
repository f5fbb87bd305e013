//! In-memory values that can be archived
//!
//! This module defines:
//! - Value: the closed set of value shapes the archive understands
//! - NumericArray, CharArray, LogicalArray: dense arrays with a shape
//! - SparseMatrix: coordinate-form sparse matrix
//! - CellArray, StructValue: composite values holding other values
//!
//! ## Layout
//!
//! Every dense array is **row-major** in memory: the last dimension varies
//! fastest. The archive stores buffers column-major; conversion happens in
//! the engine's layout module and nowhere else.
//!
//! ## Shapes
//!
//! Shapes always have at least two dimensions. Constructors normalize a
//! scalar to `[1, 1]` and a 1-D length `n` to `[1, n]`, so a value read
//! back from an archive compares equal to the value that was written.

use std::fmt;

/// Array shape (at least two dimensions once normalized)
pub type Shape = Vec<usize>;

/// Normalize a shape to at least two dimensions
pub fn normalize_shape(shape: &[usize]) -> Shape {
    match shape.len() {
        0 => vec![1, 1],
        1 => vec![1, shape[0]],
        _ => shape.to_vec(),
    }
}

/// Number of elements described by `shape`, or `None` on overflow
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Row-major linear index of a multi-dimensional index
pub fn row_major_index(shape: &[usize], index: &[usize]) -> Option<usize> {
    if shape.len() != index.len() {
        return None;
    }
    let mut linear = 0usize;
    for (&dim, &i) in shape.iter().zip(index) {
        if i >= dim {
            return None;
        }
        linear = linear * dim + i;
    }
    Some(linear)
}

/// A complex number stored as a real/imaginary pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    /// Real part
    pub re: T,
    /// Imaginary part
    pub im: T,
}

impl<T> Complex<T> {
    /// Create a complex number
    pub const fn new(re: T, im: T) -> Self {
        Complex { re, im }
    }
}

/// Element type of numeric data (component type for complex data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
}

impl Dtype {
    /// Name persisted in the `Dtype` attribute
    pub const fn name(&self) -> &'static str {
        match self {
            Dtype::Int8 => "int8",
            Dtype::Int16 => "int16",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
            Dtype::UInt8 => "uint8",
            Dtype::UInt16 => "uint16",
            Dtype::UInt32 => "uint32",
            Dtype::UInt64 => "uint64",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
        }
    }

    /// Parse a persisted dtype name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int8" => Some(Dtype::Int8),
            "int16" => Some(Dtype::Int16),
            "int32" => Some(Dtype::Int32),
            "int64" => Some(Dtype::Int64),
            "uint8" => Some(Dtype::UInt8),
            "uint16" => Some(Dtype::UInt16),
            "uint32" => Some(Dtype::UInt32),
            "uint64" => Some(Dtype::UInt64),
            "float32" => Some(Dtype::Float32),
            "float64" => Some(Dtype::Float64),
            _ => None,
        }
    }

    /// Size of one component in bytes
    pub const fn size(&self) -> usize {
        match self {
            Dtype::Int8 | Dtype::UInt8 => 1,
            Dtype::Int16 | Dtype::UInt16 => 2,
            Dtype::Int32 | Dtype::UInt32 | Dtype::Float32 => 4,
            Dtype::Int64 | Dtype::UInt64 | Dtype::Float64 => 8,
        }
    }

    /// Check if complex data may use this component type
    pub const fn is_float(&self) -> bool {
        matches!(self, Dtype::Float32 | Dtype::Float64)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Typed element storage of a numeric array
#[derive(Debug, Clone, PartialEq)]
pub enum NumericData {
    /// `i8` elements
    Int8(Vec<i8>),
    /// `i16` elements
    Int16(Vec<i16>),
    /// `i32` elements
    Int32(Vec<i32>),
    /// `i64` elements
    Int64(Vec<i64>),
    /// `u8` elements
    UInt8(Vec<u8>),
    /// `u16` elements
    UInt16(Vec<u16>),
    /// `u32` elements
    UInt32(Vec<u32>),
    /// `u64` elements
    UInt64(Vec<u64>),
    /// `f32` elements
    Float32(Vec<f32>),
    /// `f64` elements
    Float64(Vec<f64>),
    /// Complex elements with `f32` components
    Complex64(Vec<Complex<f32>>),
    /// Complex elements with `f64` components
    Complex128(Vec<Complex<f64>>),
}

/// Apply an expression to the vector inside any `NumericData` variant
#[macro_export]
macro_rules! for_each_numeric {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::value::NumericData::Int8($v) => $body,
            $crate::value::NumericData::Int16($v) => $body,
            $crate::value::NumericData::Int32($v) => $body,
            $crate::value::NumericData::Int64($v) => $body,
            $crate::value::NumericData::UInt8($v) => $body,
            $crate::value::NumericData::UInt16($v) => $body,
            $crate::value::NumericData::UInt32($v) => $body,
            $crate::value::NumericData::UInt64($v) => $body,
            $crate::value::NumericData::Float32($v) => $body,
            $crate::value::NumericData::Float64($v) => $body,
            $crate::value::NumericData::Complex64($v) => $body,
            $crate::value::NumericData::Complex128($v) => $body,
        }
    };
}

impl NumericData {
    /// Number of elements
    pub fn len(&self) -> usize {
        for_each_numeric!(self, v => v.len())
    }

    /// Check if there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component type
    pub fn dtype(&self) -> Dtype {
        match self {
            NumericData::Int8(_) => Dtype::Int8,
            NumericData::Int16(_) => Dtype::Int16,
            NumericData::Int32(_) => Dtype::Int32,
            NumericData::Int64(_) => Dtype::Int64,
            NumericData::UInt8(_) => Dtype::UInt8,
            NumericData::UInt16(_) => Dtype::UInt16,
            NumericData::UInt32(_) => Dtype::UInt32,
            NumericData::UInt64(_) => Dtype::UInt64,
            NumericData::Float32(_) | NumericData::Complex64(_) => Dtype::Float32,
            NumericData::Float64(_) | NumericData::Complex128(_) => Dtype::Float64,
        }
    }

    /// Check if the elements are complex
    pub fn is_complex(&self) -> bool {
        matches!(self, NumericData::Complex64(_) | NumericData::Complex128(_))
    }

    /// Empty storage of the given component type
    pub fn empty(dtype: Dtype, complex: bool) -> Self {
        match (dtype, complex) {
            (Dtype::Float32, true) => NumericData::Complex64(Vec::new()),
            (_, true) => NumericData::Complex128(Vec::new()),
            (Dtype::Int8, false) => NumericData::Int8(Vec::new()),
            (Dtype::Int16, false) => NumericData::Int16(Vec::new()),
            (Dtype::Int32, false) => NumericData::Int32(Vec::new()),
            (Dtype::Int64, false) => NumericData::Int64(Vec::new()),
            (Dtype::UInt8, false) => NumericData::UInt8(Vec::new()),
            (Dtype::UInt16, false) => NumericData::UInt16(Vec::new()),
            (Dtype::UInt32, false) => NumericData::UInt32(Vec::new()),
            (Dtype::UInt64, false) => NumericData::UInt64(Vec::new()),
            (Dtype::Float32, false) => NumericData::Float32(Vec::new()),
            (Dtype::Float64, false) => NumericData::Float64(Vec::new()),
        }
    }

    /// Element at a linear index, widened to `f64` (real part for complex)
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            NumericData::Int8(v) => v.get(i).map(|&x| x as f64),
            NumericData::Int16(v) => v.get(i).map(|&x| x as f64),
            NumericData::Int32(v) => v.get(i).map(|&x| x as f64),
            NumericData::Int64(v) => v.get(i).map(|&x| x as f64),
            NumericData::UInt8(v) => v.get(i).map(|&x| x as f64),
            NumericData::UInt16(v) => v.get(i).map(|&x| x as f64),
            NumericData::UInt32(v) => v.get(i).map(|&x| x as f64),
            NumericData::UInt64(v) => v.get(i).map(|&x| x as f64),
            NumericData::Float32(v) => v.get(i).map(|&x| x as f64),
            NumericData::Float64(v) => v.get(i).copied(),
            NumericData::Complex64(v) => v.get(i).map(|c| c.re as f64),
            NumericData::Complex128(v) => v.get(i).map(|c| c.re),
        }
    }
}

macro_rules! numeric_data_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for NumericData {
                fn from(v: Vec<$t>) -> Self {
                    NumericData::$variant(v)
                }
            }
        )*
    };
}

numeric_data_from!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Complex<f32> => Complex64,
    Complex<f64> => Complex128,
);

/// Dense numeric array, real or complex
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    shape: Shape,
    data: NumericData,
}

impl NumericArray {
    /// Create an array from a shape and row-major data.
    ///
    /// The shape is normalized; its agreement with the data length is
    /// checked when the value is classified for archiving.
    pub fn new(shape: impl AsRef<[usize]>, data: impl Into<NumericData>) -> Self {
        NumericArray {
            shape: normalize_shape(shape.as_ref()),
            data: data.into(),
        }
    }

    /// A real `f64` scalar
    pub fn scalar(value: f64) -> Self {
        NumericArray::new([1, 1], vec![value])
    }

    /// A complex `f64` scalar
    pub fn complex_scalar(re: f64, im: f64) -> Self {
        NumericArray::new([1, 1], vec![Complex::new(re, im)])
    }

    /// A `1 x n` row vector
    pub fn row(data: impl Into<NumericData>) -> Self {
        let data = data.into();
        NumericArray::new([1, data.len()], data)
    }

    /// An empty `f64` array keeping the given shape
    pub fn empty(shape: impl AsRef<[usize]>) -> Self {
        NumericArray::new(shape, NumericData::Float64(Vec::new()))
    }

    /// Shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major element storage
    pub fn data(&self) -> &NumericData {
        &self.data
    }

    /// Component type
    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    /// Check if the elements are complex
    pub fn is_complex(&self) -> bool {
        self.data.is_complex()
    }

    /// Check if the array has no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at a multi-dimensional index, widened to `f64`
    pub fn get_f64(&self, index: &[usize]) -> Option<f64> {
        row_major_index(&self.shape, index).and_then(|i| self.data.get_f64(i))
    }

    /// Consume into shape and data
    pub fn into_parts(self) -> (Shape, NumericData) {
        (self.shape, self.data)
    }
}

/// Text, stored as a grid of characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharArray {
    shape: Shape,
    text: String,
}

impl CharArray {
    /// A `1 x n` character row holding `text`
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        CharArray {
            shape: vec![1, len],
            text,
        }
    }

    /// A character grid with an explicit shape (characters in row-major order)
    pub fn with_shape(shape: impl AsRef<[usize]>, text: impl Into<String>) -> Self {
        CharArray {
            shape: normalize_shape(shape.as_ref()),
            text: text.into(),
        }
    }

    /// Shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The characters as a string slice
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if there is no text
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Dense boolean array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalArray {
    shape: Shape,
    data: Vec<bool>,
}

impl LogicalArray {
    /// Create an array from a shape and row-major data
    pub fn new(shape: impl AsRef<[usize]>, data: Vec<bool>) -> Self {
        LogicalArray {
            shape: normalize_shape(shape.as_ref()),
            data,
        }
    }

    /// A single boolean
    pub fn scalar(value: bool) -> Self {
        LogicalArray::new([1, 1], vec![value])
    }

    /// A `1 x n` row vector
    pub fn row(data: Vec<bool>) -> Self {
        LogicalArray::new([1, data.len()], data)
    }

    /// Shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major elements
    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Element at a multi-dimensional index
    pub fn get(&self, index: &[usize]) -> Option<bool> {
        row_major_index(&self.shape, index).and_then(|i| self.data.get(i).copied())
    }

    /// Check if there are no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Stored values of a sparse matrix
#[derive(Debug, Clone, PartialEq)]
pub enum SparseValues {
    /// Real values
    Real(Vec<f64>),
    /// Complex values
    Complex(Vec<Complex<f64>>),
}

impl SparseValues {
    /// Number of stored values
    pub fn len(&self) -> usize {
        match self {
            SparseValues::Real(v) => v.len(),
            SparseValues::Complex(v) => v.len(),
        }
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn permuted(&self, order: &[usize]) -> SparseValues {
        match self {
            SparseValues::Real(v) => SparseValues::Real(order.iter().map(|&i| v[i]).collect()),
            SparseValues::Complex(v) => {
                SparseValues::Complex(order.iter().map(|&i| v[i]).collect())
            }
        }
    }
}

/// Two-dimensional sparse matrix in coordinate form.
///
/// Stored entries are kept exactly, including explicit zeros. Indices are
/// 0-based in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    row_indices: Vec<usize>,
    col_indices: Vec<usize>,
    values: SparseValues,
}

impl SparseMatrix {
    /// Real sparse matrix from `(row, col, value)` triplets
    pub fn from_triplets(rows: usize, cols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
        let mut row_indices = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        for (r, c, v) in triplets {
            row_indices.push(r);
            col_indices.push(c);
            values.push(v);
        }
        SparseMatrix::from_parts(rows, cols, row_indices, col_indices, SparseValues::Real(values))
    }

    /// Complex sparse matrix from `(row, col, value)` triplets
    pub fn from_complex_triplets(
        rows: usize,
        cols: usize,
        triplets: Vec<(usize, usize, Complex<f64>)>,
    ) -> Self {
        let mut row_indices = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        for (r, c, v) in triplets {
            row_indices.push(r);
            col_indices.push(c);
            values.push(v);
        }
        SparseMatrix::from_parts(
            rows,
            cols,
            row_indices,
            col_indices,
            SparseValues::Complex(values),
        )
    }

    /// Build from parallel index and value sequences without validation
    pub fn from_parts(
        rows: usize,
        cols: usize,
        row_indices: Vec<usize>,
        col_indices: Vec<usize>,
        values: SparseValues,
    ) -> Self {
        SparseMatrix {
            rows,
            cols,
            row_indices,
            col_indices,
            values,
        }
    }

    /// Shape as `[rows, cols]`
    pub fn shape(&self) -> Shape {
        vec![self.rows, self.cols]
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Row index of each stored entry
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    /// Column index of each stored entry
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Stored values
    pub fn values(&self) -> &SparseValues {
        &self.values
    }

    /// Check if the values are complex
    pub fn is_complex(&self) -> bool {
        matches!(self.values, SparseValues::Complex(_))
    }

    /// Copy with entries in canonical order: row ascending, then column ascending.
    ///
    /// The sort is stable, so duplicate coordinates keep their relative order.
    pub fn to_canonical(&self) -> SparseMatrix {
        let mut order: Vec<usize> = (0..self.row_indices.len()).collect();
        order.sort_by_key(|&i| (self.row_indices[i], self.col_indices[i]));
        SparseMatrix {
            rows: self.rows,
            cols: self.cols,
            row_indices: order.iter().map(|&i| self.row_indices[i]).collect(),
            col_indices: order.iter().map(|&i| self.col_indices[i]).collect(),
            values: self.values.permuted(&order),
        }
    }

    /// First coordinate stored more than once, if any
    pub fn find_duplicate(&self) -> Option<(usize, usize)> {
        let canonical = self.to_canonical();
        canonical
            .row_indices
            .windows(2)
            .zip(canonical.col_indices.windows(2))
            .find(|(r, c)| r[0] == r[1] && c[0] == c[1])
            .map(|(r, c)| (r[0], c[0]))
    }
}

/// Ordered, heterogeneous collection with a shape
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    shape: Shape,
    elements: Vec<Value>,
}

impl CellArray {
    /// Create a cell array from a shape and row-major elements
    pub fn new(shape: impl AsRef<[usize]>, elements: Vec<Value>) -> Self {
        CellArray {
            shape: normalize_shape(shape.as_ref()),
            elements,
        }
    }

    /// A `1 x n` cell row
    pub fn row(elements: Vec<Value>) -> Self {
        CellArray::new([1, elements.len()], elements)
    }

    /// Shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major elements
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Element at a multi-dimensional index
    pub fn get(&self, index: &[usize]) -> Option<&Value> {
        row_major_index(&self.shape, index).and_then(|i| self.elements.get(i))
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if there are no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Consume into shape and elements
    pub fn into_parts(self) -> (Shape, Vec<Value>) {
        (self.shape, self.elements)
    }
}

/// Field-keyed record. Field order is significant and preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    class_name: Option<String>,
    fields: Vec<(String, Value)>,
}

impl StructValue {
    /// Create an empty struct
    pub fn new() -> Self {
        StructValue::default()
    }

    /// Attach a class-name hint used when reconstructing the value
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Append a field (builder form of [`StructValue::insert`])
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing in place if it exists, appending otherwise.
    ///
    /// Returns the previous value of the field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Look up a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Fields in order
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Class-name hint
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A value with no safe archive encoding (function handles, foreign objects)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueValue {
    /// Semantic type name of the original value
    pub class_name: String,
}

impl OpaqueValue {
    /// Create an opaque value
    pub fn new(class_name: impl Into<String>) -> Self {
        OpaqueValue {
            class_name: class_name.into(),
        }
    }
}

/// A value the archive can store
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Dense numeric array
    Numeric(NumericArray),
    /// Text
    Character(CharArray),
    /// Dense boolean array
    Logical(LogicalArray),
    /// Sparse numeric matrix
    Sparse(SparseMatrix),
    /// Ordered heterogeneous collection
    Cell(CellArray),
    /// Field-keyed record
    Struct(StructValue),
    /// Raw bytes
    File(Vec<u8>),
    /// Value with no safe encoding
    Opaque(OpaqueValue),
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Numeric(_) => "Numeric",
            Value::Character(_) => "Character",
            Value::Logical(_) => "Logical",
            Value::Sparse(_) => "Sparse",
            Value::Cell(_) => "Cell",
            Value::Struct(_) => "Struct",
            Value::File(_) => "File",
            Value::Opaque(_) => "Opaque",
        }
    }

    /// Get as &NumericArray if this is a Numeric value
    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            Value::Numeric(a) => Some(a),
            _ => None,
        }
    }

    /// Get as &str if this is a Character value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Character(c) => Some(c.as_str()),
            _ => None,
        }
    }

    /// Get as &LogicalArray if this is a Logical value
    pub fn as_logical(&self) -> Option<&LogicalArray> {
        match self {
            Value::Logical(a) => Some(a),
            _ => None,
        }
    }

    /// Get as &SparseMatrix if this is a Sparse value
    pub fn as_sparse(&self) -> Option<&SparseMatrix> {
        match self {
            Value::Sparse(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &CellArray if this is a Cell value
    pub fn as_cell(&self) -> Option<&CellArray> {
        match self {
            Value::Cell(c) => Some(c),
            _ => None,
        }
    }

    /// Get as &StructValue if this is a Struct value
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a File value
    pub fn as_file(&self) -> Option<&[u8]> {
        match self {
            Value::File(b) => Some(b),
            _ => None,
        }
    }

    /// Check if this is an opaque value
    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Opaque(_))
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Numeric(NumericArray::scalar(f))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Numeric(NumericArray::new([1, 1], vec![f]))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Numeric(NumericArray::new([1, 1], vec![i]))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Numeric(NumericArray::new([1, 1], vec![i]))
    }
}

impl From<Complex<f64>> for Value {
    fn from(c: Complex<f64>) -> Self {
        Value::Numeric(NumericArray::complex_scalar(c.re, c.im))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(LogicalArray::scalar(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Character(CharArray::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Character(CharArray::new(s))
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Numeric(NumericArray::row(v))
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Value::Logical(LogicalArray::row(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Cell(CellArray::row(v))
    }
}

impl From<NumericArray> for Value {
    fn from(a: NumericArray) -> Self {
        Value::Numeric(a)
    }
}

impl From<CharArray> for Value {
    fn from(c: CharArray) -> Self {
        Value::Character(c)
    }
}

impl From<LogicalArray> for Value {
    fn from(a: LogicalArray) -> Self {
        Value::Logical(a)
    }
}

impl From<SparseMatrix> for Value {
    fn from(s: SparseMatrix) -> Self {
        Value::Sparse(s)
    }
}

impl From<CellArray> for Value {
    fn from(c: CellArray) -> Self {
        Value::Cell(c)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(s)
    }
}

impl From<OpaqueValue> for Value {
    fn from(o: OpaqueValue) -> Self {
        Value::Opaque(o)
    }
}
