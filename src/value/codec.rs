//! Byte encodings shared by pages, statistics and filter bounds.
//!
//! Dimension encodings are order preserving: comparing two encoded values
//! byte by byte gives the same answer as comparing the logical values.
//!
//! | column                   | encoding                                        | null          |
//! |--------------------------|-------------------------------------------------|---------------|
//! | string, no dictionary    | UTF-8 bytes                                     | `@NU#LL$!`    |
//! | primitive, no dictionary | big-endian, sign bit flipped (floats: inverted) | empty         |
//! | date, direct dictionary  | 4-byte big-endian surrogate `days - i32::MIN + 2` | surrogate `1` |
//!
//! Measure statistics and defaults use plain big-endian fixed widths (8-byte
//! integers and floats, 16-byte decimals, 4-byte dates); empty bytes mean null.

use arrow::datatypes::DataType;
use bytes::Bytes;
use thiserror::Error;

use crate::value::MeasureValue;

/// Null marker stored by string columns without a dictionary.
pub const MEMBER_DEFAULT: &[u8] = b"@NU#LL$!";

/// Surrogate reserved for null dates.
pub const DATE_NULL_SURROGATE: u32 = 1;

const DATE_SURROGATE_BASE: i64 = 2 - i32::MIN as i64;

static DATE_NULL_BYTES: [u8; 4] = DATE_NULL_SURROGATE.to_be_bytes();

const SIGN_64: u64 = 1 << 63;
const SIGN_32: u32 = 1 << 31;

/// Errors raised while encoding or decoding values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The encoded value does not have the width its type requires.
    #[error("invalid encoded length for {data_type:?}: expected {expected}, got {actual}")]
    InvalidLength {
        /// Logical type being decoded.
        data_type: DataType,
        /// Width the type requires.
        expected: usize,
        /// Width that was found.
        actual: usize,
    },
    /// The value cannot be represented by the target type.
    #[error("value {value} out of range for {data_type:?}")]
    OutOfRange {
        /// Target logical type.
        data_type: DataType,
        /// Rendered offending value.
        value: String,
    },
    /// The type has no encoding here.
    #[error("unsupported data type {0:?}")]
    UnsupportedType(DataType),
}

/// Encoded null value of a date column.
#[must_use]
pub fn date_null_value() -> Bytes {
    Bytes::from_static(&DATE_NULL_BYTES)
}

/// Encode days since the epoch as a date surrogate.
pub fn encode_date(days: i32) -> Result<Bytes, CodecError> {
    let surrogate =
        u32::try_from(i64::from(days) + DATE_SURROGATE_BASE).map_err(|_| CodecError::OutOfRange {
            data_type: DataType::Date32,
            value: days.to_string(),
        })?;
    Ok(Bytes::copy_from_slice(&surrogate.to_be_bytes()))
}

/// Decode a date surrogate, `None` for the null surrogate.
pub fn decode_date(bytes: &[u8]) -> Result<Option<i32>, CodecError> {
    let surrogate = u32::from_be_bytes(fixed::<4>(bytes, &DataType::Date32)?);
    if surrogate <= DATE_NULL_SURROGATE {
        return Ok(None);
    }
    let days = i64::from(surrogate) - DATE_SURROGATE_BASE;
    i32::try_from(days)
        .map(Some)
        .map_err(|_| CodecError::OutOfRange {
            data_type: DataType::Date32,
            value: surrogate.to_string(),
        })
}

/// Encode a primitive no-dictionary dimension value in an order preserving way.
pub fn encode_primitive(value: &MeasureValue, data_type: &DataType) -> Result<Bytes, CodecError> {
    let out_of_range = || CodecError::OutOfRange {
        data_type: data_type.clone(),
        value: format!("{value:?}"),
    };
    let encoded = match data_type {
        DataType::Boolean => match integer(value).ok_or_else(out_of_range)? {
            0 => vec![0],
            1 => vec![1],
            _ => return Err(out_of_range()),
        },
        DataType::Int8 => {
            let v = i8::try_from(integer(value).ok_or_else(out_of_range)?)
                .map_err(|_| out_of_range())?;
            vec![(v as u8) ^ 0x80]
        }
        DataType::Int16 => {
            let v = i16::try_from(integer(value).ok_or_else(out_of_range)?)
                .map_err(|_| out_of_range())?;
            ((v as u16) ^ 0x8000).to_be_bytes().to_vec()
        }
        DataType::Int32 => {
            let v = i32::try_from(integer(value).ok_or_else(out_of_range)?)
                .map_err(|_| out_of_range())?;
            ((v as u32) ^ SIGN_32).to_be_bytes().to_vec()
        }
        DataType::Int64 | DataType::Timestamp(_, _) => {
            let v = integer(value).ok_or_else(out_of_range)?;
            ((v as u64) ^ SIGN_64).to_be_bytes().to_vec()
        }
        DataType::Float32 => {
            let v = float(value).ok_or_else(out_of_range)? as f32;
            order_f32(v).to_be_bytes().to_vec()
        }
        DataType::Float64 => {
            let v = float(value).ok_or_else(out_of_range)?;
            order_f64(v).to_be_bytes().to_vec()
        }
        other => return Err(CodecError::UnsupportedType(other.clone())),
    };
    Ok(Bytes::from(encoded))
}

/// Decode a primitive no-dictionary dimension value; empty bytes decode to `None`.
pub fn decode_primitive(
    bytes: &[u8],
    data_type: &DataType,
) -> Result<Option<MeasureValue>, CodecError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let value = match data_type {
        DataType::Boolean => MeasureValue::Int64(i64::from(fixed::<1>(bytes, data_type)?[0])),
        DataType::Int8 => {
            let raw = fixed::<1>(bytes, data_type)?[0] ^ 0x80;
            MeasureValue::Int64(i64::from(raw as i8))
        }
        DataType::Int16 => {
            let raw = u16::from_be_bytes(fixed::<2>(bytes, data_type)?) ^ 0x8000;
            MeasureValue::Int64(i64::from(raw as i16))
        }
        DataType::Int32 => {
            let raw = u32::from_be_bytes(fixed::<4>(bytes, data_type)?) ^ SIGN_32;
            MeasureValue::Int64(i64::from(raw as i32))
        }
        DataType::Int64 => {
            let raw = u64::from_be_bytes(fixed::<8>(bytes, data_type)?) ^ SIGN_64;
            MeasureValue::Int64(raw as i64)
        }
        DataType::Timestamp(_, _) => {
            let raw = u64::from_be_bytes(fixed::<8>(bytes, data_type)?) ^ SIGN_64;
            MeasureValue::Timestamp(raw as i64)
        }
        DataType::Float32 => {
            let raw = u32::from_be_bytes(fixed::<4>(bytes, data_type)?);
            MeasureValue::Float64(f64::from(unorder_f32(raw)))
        }
        DataType::Float64 => {
            let raw = u64::from_be_bytes(fixed::<8>(bytes, data_type)?);
            MeasureValue::Float64(unorder_f64(raw))
        }
        other => return Err(CodecError::UnsupportedType(other.clone())),
    };
    Ok(Some(value))
}

/// Encode a measure value the way statistics and defaults store it.
#[must_use]
pub fn encode_measure(value: &MeasureValue) -> Bytes {
    let encoded = match *value {
        MeasureValue::Int64(v) | MeasureValue::Timestamp(v) => v.to_be_bytes().to_vec(),
        MeasureValue::Float64(v) => v.to_bits().to_be_bytes().to_vec(),
        MeasureValue::Decimal128 { value, .. } => value.to_be_bytes().to_vec(),
        MeasureValue::Date32(v) => v.to_be_bytes().to_vec(),
    };
    Bytes::from(encoded)
}

/// Decode a stored measure statistic or default; empty bytes decode to `None`.
pub fn decode_measure(
    bytes: &[u8],
    data_type: &DataType,
) -> Result<Option<MeasureValue>, CodecError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let value = match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => {
            MeasureValue::Int64(i64::from_be_bytes(fixed::<8>(bytes, data_type)?))
        }
        DataType::Float32 | DataType::Float64 => {
            MeasureValue::Float64(f64::from_bits(u64::from_be_bytes(fixed::<8>(bytes, data_type)?)))
        }
        DataType::Decimal128(_, scale) => MeasureValue::Decimal128 {
            value: i128::from_be_bytes(fixed::<16>(bytes, data_type)?),
            scale: *scale,
        },
        DataType::Date32 => MeasureValue::Date32(i32::from_be_bytes(fixed::<4>(bytes, data_type)?)),
        DataType::Timestamp(_, _) => {
            MeasureValue::Timestamp(i64::from_be_bytes(fixed::<8>(bytes, data_type)?))
        }
        other => return Err(CodecError::UnsupportedType(other.clone())),
    };
    Ok(Some(value))
}

fn fixed<const N: usize>(bytes: &[u8], data_type: &DataType) -> Result<[u8; N], CodecError> {
    <[u8; N]>::try_from(bytes).map_err(|_| CodecError::InvalidLength {
        data_type: data_type.clone(),
        expected: N,
        actual: bytes.len(),
    })
}

fn integer(value: &MeasureValue) -> Option<i64> {
    match *value {
        MeasureValue::Int64(v) | MeasureValue::Timestamp(v) => Some(v),
        _ => None,
    }
}

fn float(value: &MeasureValue) -> Option<f64> {
    match *value {
        MeasureValue::Float64(v) => Some(v),
        MeasureValue::Int64(v) => Some(v as f64),
        _ => None,
    }
}

fn order_f64(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits & SIGN_64 != 0 {
        !bits
    } else {
        bits | SIGN_64
    }
}

fn unorder_f64(bits: u64) -> f64 {
    if bits & SIGN_64 != 0 {
        f64::from_bits(bits & !SIGN_64)
    } else {
        f64::from_bits(!bits)
    }
}

fn order_f32(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits & SIGN_32 != 0 {
        !bits
    } else {
        bits | SIGN_32
    }
}

fn unorder_f32(bits: u32) -> f32 {
    if bits & SIGN_32 != 0 {
        f32::from_bits(bits & !SIGN_32)
    } else {
        f32::from_bits(!bits)
    }
}
