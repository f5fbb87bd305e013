//! Dense payload codec
//!
//! Numeric, character, logical and file payloads are one dataset each: a
//! flat little-endian buffer in column-major order plus attributes that
//! say how to read it back.

use crate::envelope::{ARRAY_SIZE, COMPLEX, DTYPE, EMPTY, ENCODING, RECORD_TYPE, SPARSE};
use crate::layout::{from_column_major, to_column_major};
use byteorder::{ByteOrder, LittleEndian};
use sdarc_core::{
    element_count, AttrMap, AttrMapExt, AttrValue, CharArray, Complex, Dtype, Error,
    LogicalArray, NumericArray, NumericData, RecordKind, Result, Value,
};

/// Text encoding of character payloads
pub const UTF8: &str = "utf-8";

/// Encoded dataset: bytes, buffer shape hint and payload attributes
pub(crate) struct EncodedBuffer {
    pub bytes: Vec<u8>,
    pub shape: Vec<usize>,
    pub attrs: AttrMap,
}

fn base_attrs(kind: RecordKind, shape: &[usize], is_empty: bool) -> AttrMap {
    let mut attrs = AttrMap::new();
    attrs.insert(RECORD_TYPE.into(), AttrValue::from(kind.tag()));
    attrs.insert(EMPTY.into(), AttrValue::flag(is_empty));
    attrs.insert(ARRAY_SIZE.into(), AttrValue::dims(shape));
    attrs
}

macro_rules! le_bytes {
    ($values:expr, $size:expr, $write:ident) => {{
        let values = $values;
        let mut buf = vec![0u8; values.len() * $size];
        LittleEndian::$write(&values, &mut buf);
        buf
    }};
}

macro_rules! le_values {
    ($bytes:expr, $ty:ty, $read:ident) => {{
        let bytes = $bytes;
        let mut values: Vec<$ty> = vec![<$ty>::default(); bytes.len() / std::mem::size_of::<$ty>()];
        LittleEndian::$read(bytes, &mut values);
        values
    }};
}

/// Encode a dense payload value
pub(crate) fn encode(value: &Value) -> Result<EncodedBuffer> {
    match value {
        Value::Numeric(a) => Ok(encode_numeric(a)),
        Value::Character(c) => Ok(encode_character(c)),
        Value::Logical(a) => Ok(encode_logical(a)),
        Value::File(bytes) => Ok(EncodedBuffer {
            bytes: bytes.clone(),
            shape: vec![1, bytes.len()],
            attrs: base_attrs(RecordKind::File, &[1, bytes.len()], bytes.is_empty()),
        }),
        other => Err(Error::invalid_argument(format!(
            "{} is not a dense payload",
            other.type_name()
        ))),
    }
}

fn encode_numeric(array: &NumericArray) -> EncodedBuffer {
    let shape = array.shape();
    let bytes = match array.data() {
        NumericData::Int8(v) => to_column_major(shape, v).into_iter().map(|x| x as u8).collect::<Vec<u8>>(),
        NumericData::UInt8(v) => to_column_major(shape, v),
        NumericData::Int16(v) => le_bytes!(to_column_major(shape, v), 2, write_i16_into),
        NumericData::UInt16(v) => le_bytes!(to_column_major(shape, v), 2, write_u16_into),
        NumericData::Int32(v) => le_bytes!(to_column_major(shape, v), 4, write_i32_into),
        NumericData::UInt32(v) => le_bytes!(to_column_major(shape, v), 4, write_u32_into),
        NumericData::Int64(v) => le_bytes!(to_column_major(shape, v), 8, write_i64_into),
        NumericData::UInt64(v) => le_bytes!(to_column_major(shape, v), 8, write_u64_into),
        NumericData::Float32(v) => le_bytes!(to_column_major(shape, v), 4, write_f32_into),
        NumericData::Float64(v) => le_bytes!(to_column_major(shape, v), 8, write_f64_into),
        NumericData::Complex64(v) => le_bytes!(split_complex(&to_column_major(shape, v)), 4, write_f32_into),
        NumericData::Complex128(v) => le_bytes!(split_complex(&to_column_major(shape, v)), 8, write_f64_into),
    };

    let count = array.data().len();
    let buffer_shape = if array.is_complex() {
        vec![count, 2]
    } else {
        shape.to_vec()
    };

    let mut attrs = base_attrs(RecordKind::Numeric, shape, array.is_empty());
    attrs.insert(COMPLEX.into(), AttrValue::flag(array.is_complex()));
    attrs.insert(SPARSE.into(), AttrValue::flag(false));
    attrs.insert(DTYPE.into(), AttrValue::from(array.dtype().name()));

    EncodedBuffer {
        bytes,
        shape: buffer_shape,
        attrs,
    }
}

/// All real parts followed by all imaginary parts
pub(crate) fn split_complex<T: Copy>(values: &[Complex<T>]) -> Vec<T> {
    values
        .iter()
        .map(|c| c.re)
        .chain(values.iter().map(|c| c.im))
        .collect()
}

/// Inverse of [`split_complex`]; `parts` has even length
pub(crate) fn join_complex<T: Copy>(parts: &[T]) -> Vec<Complex<T>> {
    let (re, im) = parts.split_at(parts.len() / 2);
    re.iter().zip(im).map(|(&re, &im)| Complex::new(re, im)).collect()
}

fn encode_character(c: &CharArray) -> EncodedBuffer {
    let chars: Vec<char> = c.as_str().chars().collect();
    let text: String = to_column_major(c.shape(), &chars).into_iter().collect();
    let mut attrs = base_attrs(RecordKind::Character, c.shape(), c.is_empty());
    attrs.insert(ENCODING.into(), AttrValue::from(UTF8));
    EncodedBuffer {
        shape: vec![1, text.len()],
        bytes: text.into_bytes(),
        attrs,
    }
}

fn encode_logical(a: &LogicalArray) -> EncodedBuffer {
    let bytes = to_column_major(a.shape(), a.data())
        .into_iter()
        .map(u8::from)
        .collect();
    EncodedBuffer {
        bytes,
        shape: a.shape().to_vec(),
        attrs: base_attrs(RecordKind::Logical, a.shape(), a.is_empty()),
    }
}

/// Decode a dense payload from its attributes and buffer
pub(crate) fn decode(kind: RecordKind, attrs: &AttrMap, bytes: Vec<u8>) -> Result<Value> {
    let shape = attrs.require_shape(ARRAY_SIZE)?;
    let count = element_count(&shape)
        .ok_or_else(|| Error::corruption(format!("shape {:?} overflows", shape)))?;

    match kind {
        RecordKind::Numeric => {
            let dtype = attrs.require_text(DTYPE)?;
            let dtype = Dtype::from_name(dtype)
                .ok_or_else(|| Error::corruption(format!("unknown dtype '{}'", dtype)))?;
            let complex = attrs.flag_or_false(COMPLEX)?;
            decode_numeric(&shape, count, dtype, complex, &bytes).map(Value::Numeric)
        }
        RecordKind::Character => {
            if let Some(encoding) = attrs.text(ENCODING) {
                if !encoding.eq_ignore_ascii_case(UTF8) {
                    return Err(Error::corruption(format!(
                        "unsupported text encoding '{}'",
                        encoding
                    )));
                }
            }
            let text = String::from_utf8(bytes)
                .map_err(|e| Error::corruption(format!("character data is not UTF-8: {}", e)))?;
            let chars: Vec<char> = text.chars().collect();
            check_count(chars.len(), count, &shape)?;
            let text: String = from_column_major(&shape, &chars).into_iter().collect();
            Ok(Value::Character(CharArray::with_shape(shape, text)))
        }
        RecordKind::Logical => {
            check_count(bytes.len(), count, &shape)?;
            let data: Vec<bool> = bytes.iter().map(|&b| b != 0).collect();
            Ok(Value::Logical(LogicalArray::new(
                &shape,
                from_column_major(&shape, &data),
            )))
        }
        RecordKind::File => {
            check_count(bytes.len(), count, &shape)?;
            Ok(Value::File(bytes))
        }
        other => Err(Error::corruption(format!(
            "{} record stored as a dense payload",
            other
        ))),
    }
}

fn check_count(len: usize, expected: usize, shape: &[usize]) -> Result<()> {
    if len != expected {
        return Err(Error::corruption(format!(
            "payload has {} elements but shape {:?} needs {}",
            len, shape, expected
        )));
    }
    Ok(())
}

fn decode_numeric(
    shape: &[usize],
    count: usize,
    dtype: Dtype,
    complex: bool,
    bytes: &[u8],
) -> Result<NumericArray> {
    if complex && !dtype.is_float() {
        return Err(Error::corruption(format!(
            "complex data with non-float dtype {}",
            dtype
        )));
    }

    let components = if complex { count * 2 } else { count };
    let expected = components
        .checked_mul(dtype.size())
        .ok_or_else(|| Error::corruption(format!("shape {:?} overflows", shape)))?;
    if bytes.len() != expected {
        return Err(Error::corruption(format!(
            "{} buffer has {} bytes, shape {:?} needs {}",
            dtype,
            bytes.len(),
            shape,
            expected
        )));
    }

    let data = match (dtype, complex) {
        (Dtype::Float32, true) => {
            let parts = le_values!(bytes, f32, read_f32_into);
            NumericData::Complex64(from_column_major(shape, &join_complex(&parts)))
        }
        (Dtype::Float64, true) => {
            let parts = le_values!(bytes, f64, read_f64_into);
            NumericData::Complex128(from_column_major(shape, &join_complex(&parts)))
        }
        (Dtype::Int8, _) => {
            let values: Vec<i8> = bytes.iter().map(|&b| b as i8).collect();
            NumericData::Int8(from_column_major(shape, &values))
        }
        (Dtype::UInt8, _) => NumericData::UInt8(from_column_major(shape, bytes)),
        (Dtype::Int16, _) => NumericData::Int16(from_column_major(shape, &le_values!(bytes, i16, read_i16_into))),
        (Dtype::UInt16, _) => NumericData::UInt16(from_column_major(shape, &le_values!(bytes, u16, read_u16_into))),
        (Dtype::Int32, _) => NumericData::Int32(from_column_major(shape, &le_values!(bytes, i32, read_i32_into))),
        (Dtype::UInt32, _) => NumericData::UInt32(from_column_major(shape, &le_values!(bytes, u32, read_u32_into))),
        (Dtype::Int64, _) => NumericData::Int64(from_column_major(shape, &le_values!(bytes, i64, read_i64_into))),
        (Dtype::UInt64, _) => NumericData::UInt64(from_column_major(shape, &le_values!(bytes, u64, read_u64_into))),
        (Dtype::Float32, false) => NumericData::Float32(from_column_major(shape, &le_values!(bytes, f32, read_f32_into))),
        (Dtype::Float64, false) => NumericData::Float64(from_column_major(shape, &le_values!(bytes, f64, read_f64_into))),
    };
    Ok(NumericArray::new(shape, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roundtrip(value: &Value) -> Value {
        let encoded = encode(value).unwrap();
        let kind = RecordKind::from_tag(
            encoded.attrs.text(RECORD_TYPE).unwrap(),
            false,
        );
        decode(kind, &encoded.attrs, encoded.bytes).unwrap()
    }

    #[test]
    fn test_numeric_buffer_is_column_major() {
        let value = Value::Numeric(NumericArray::new([2, 3], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]));
        let encoded = encode(&value).unwrap();
        let mut stored = vec![0.0f64; 6];
        LittleEndian::read_f64_into(&encoded.bytes, &mut stored);
        assert_eq!(stored, vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        assert_eq!(encoded.shape, vec![2, 3]);
        assert_eq!(encoded.attrs[DTYPE], AttrValue::from("float64"));
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_every_dtype_roundtrips() {
        let values = vec![
            Value::Numeric(NumericArray::new([2, 2], vec![-1i8, 2, -3, 4])),
            Value::Numeric(NumericArray::new([2, 2], vec![1u8, 2, 3, 255])),
            Value::Numeric(NumericArray::new([2, 2], vec![-1i16, 2, -3, i16::MAX])),
            Value::Numeric(NumericArray::new([2, 2], vec![1u16, 2, 3, u16::MAX])),
            Value::Numeric(NumericArray::new([2, 2], vec![-1i32, 2, -3, i32::MIN])),
            Value::Numeric(NumericArray::new([2, 2], vec![1u32, 2, 3, u32::MAX])),
            Value::Numeric(NumericArray::new([2, 2], vec![-1i64, 2, -3, i64::MAX])),
            Value::Numeric(NumericArray::new([2, 2], vec![1u64, 2, 3, u64::MAX])),
            Value::Numeric(NumericArray::new([2, 2], vec![1.5f32, -2.0, 0.0, f32::MAX])),
            Value::Numeric(NumericArray::new([2, 2], vec![1.5f64, -2.0, 0.0, f64::MIN])),
        ];
        for value in values {
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn test_complex_layout() {
        let value = Value::Numeric(NumericArray::new(
            [1, 2],
            vec![Complex::new(1.0f64, 2.0), Complex::new(3.0, 4.0)],
        ));
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded.shape, vec![2, 2]);
        assert_eq!(encoded.attrs[COMPLEX], AttrValue::from("yes"));
        let mut stored = vec![0.0f64; 4];
        LittleEndian::read_f64_into(&encoded.bytes, &mut stored);
        assert_eq!(stored, vec![1.0, 3.0, 2.0, 4.0]);
        assert_eq!(roundtrip(&value), value);

        let single = Value::Numeric(NumericArray::new([1, 1], vec![Complex::new(1.0f32, -1.0)]));
        assert_eq!(roundtrip(&single), single);
    }

    #[test]
    fn test_empty_numeric_keeps_shape() {
        let value = Value::Numeric(NumericArray::empty([0, 3]));
        let encoded = encode(&value).unwrap();
        assert!(encoded.bytes.is_empty());
        assert_eq!(encoded.attrs[EMPTY], AttrValue::from("yes"));
        assert_eq!(encoded.attrs[ARRAY_SIZE], AttrValue::dims(&[0, 3]));
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_character() {
        let value = Value::from("héllo wörld");
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded.attrs[ENCODING], AttrValue::from("utf-8"));
        assert_eq!(roundtrip(&value), value);

        let grid = Value::Character(CharArray::with_shape([2, 3], "abcdef"));
        let encoded = encode(&grid).unwrap();
        assert_eq!(encoded.bytes, b"adbecf".to_vec());
        assert_eq!(roundtrip(&grid), grid);

        assert_eq!(roundtrip(&Value::from("")), Value::from(""));
    }

    #[test]
    fn test_logical() {
        let value = Value::Logical(LogicalArray::new(
            [2, 2],
            vec![true, false, false, true],
        ));
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded.bytes, vec![1, 0, 0, 1]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_logical_nonzero_is_true() {
        let attrs = base_attrs(RecordKind::Logical, &[1, 2], false);
        let value = decode(RecordKind::Logical, &attrs, vec![0, 7]).unwrap();
        assert_eq!(value, Value::from(vec![false, true]));
    }

    #[test]
    fn test_file() {
        let value = Value::File(b"raw bytes".to_vec());
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_nan_is_stored_as_data() {
        let value = Value::Numeric(NumericArray::new([1, 2], vec![f64::NAN, 1.0]));
        match roundtrip(&value) {
            Value::Numeric(a) => match a.data() {
                NumericData::Float64(v) => {
                    assert!(v[0].is_nan());
                    assert_eq!(v[1], 1.0);
                }
                other => panic!("unexpected data {:?}", other),
            },
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        let encoded = encode(&Value::from(vec![1.0, 2.0])).unwrap();

        let mut truncated = encoded.bytes.clone();
        truncated.pop();
        assert!(decode(RecordKind::Numeric, &encoded.attrs, truncated)
            .unwrap_err()
            .is_corruption());

        let mut attrs = encoded.attrs.clone();
        attrs.insert(DTYPE.into(), AttrValue::from("float128"));
        assert!(decode(RecordKind::Numeric, &attrs, encoded.bytes.clone())
            .unwrap_err()
            .is_corruption());

        let mut attrs = encoded.attrs.clone();
        attrs.insert(DTYPE.into(), AttrValue::from("int64"));
        attrs.insert(COMPLEX.into(), AttrValue::flag(true));
        assert!(decode(RecordKind::Numeric, &attrs, encoded.bytes.clone())
            .unwrap_err()
            .is_corruption());

        let mut attrs = encoded.attrs;
        attrs.remove(ARRAY_SIZE);
        assert!(decode(RecordKind::Numeric, &attrs, encoded.bytes)
            .unwrap_err()
            .is_corruption());

        let attrs = base_attrs(RecordKind::Character, &[1, 2], false);
        assert!(decode(RecordKind::Character, &attrs, vec![0xFF, 0xFE])
            .unwrap_err()
            .is_corruption());
    }

    proptest! {
        #[test]
        fn prop_f64_matrix_roundtrip(
            rows in 0usize..5,
            cols in 0usize..5,
            seed in prop::collection::vec(-1e6f64..1e6, 25),
        ) {
            let data: Vec<f64> = seed.into_iter().take(rows * cols).collect();
            let value = Value::Numeric(NumericArray::new([rows, cols], data));
            prop_assert_eq!(roundtrip(&value), value);
        }

        #[test]
        fn prop_i32_3d_roundtrip(data in prop::collection::vec(any::<i32>(), 12)) {
            let value = Value::Numeric(NumericArray::new([2, 3, 2], data));
            prop_assert_eq!(roundtrip(&value), value);
        }
    }
}
