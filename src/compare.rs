//! Total orders used by the range filter.
//!
//! Dimension values are compared as raw bytes; the encodings in
//! [`crate::value::codec`] make that order match the logical one. Measure
//! values go through a [`MeasureComparator`] picked once from the column type.

use std::cmp::Ordering;

use arrow::datatypes::DataType;

use crate::value::MeasureValue;

/// Lexicographic order over encoded dimension values.
#[inline]
#[must_use]
pub fn compare_bytes(left: &[u8], right: &[u8]) -> Ordering {
    left.cmp(right)
}

/// Type-specific strict total order for measure values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureComparator {
    /// Signed and small unsigned integers, booleans.
    Integer,
    /// `f32` / `f64`, ordered with `total_cmp`.
    Floating,
    /// Decimals, ordered by numeric value regardless of scale.
    Decimal {
        /// Scale declared by the column.
        scale: i8,
    },
    /// Days since the epoch.
    Date,
    /// Timestamps in the column's unit.
    Timestamp,
}

impl MeasureComparator {
    /// Select the comparator for a logical type, `None` if the type is not orderable here.
    #[must_use]
    pub fn for_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32 => Some(MeasureComparator::Integer),
            DataType::Float32 | DataType::Float64 => Some(MeasureComparator::Floating),
            DataType::Decimal128(_, scale) => Some(MeasureComparator::Decimal { scale: *scale }),
            DataType::Date32 => Some(MeasureComparator::Date),
            DataType::Timestamp(_, _) => Some(MeasureComparator::Timestamp),
            _ => None,
        }
    }

    /// Convert a literal into the representation this comparator orders natively.
    ///
    /// Returns `None` when the literal cannot be expressed in the column's family.
    #[must_use]
    pub fn coerce(&self, value: MeasureValue) -> Option<MeasureValue> {
        match (self, value) {
            (MeasureComparator::Integer, MeasureValue::Int64(_))
            | (MeasureComparator::Floating, MeasureValue::Float64(_))
            | (MeasureComparator::Decimal { .. }, MeasureValue::Decimal128 { .. })
            | (MeasureComparator::Date, MeasureValue::Date32(_))
            | (MeasureComparator::Timestamp, MeasureValue::Timestamp(_)) => Some(value),
            (MeasureComparator::Floating, MeasureValue::Int64(v)) => {
                Some(MeasureValue::Float64(v as f64))
            }
            (MeasureComparator::Floating, MeasureValue::Decimal128 { .. }) => {
                Some(MeasureValue::Float64(value.as_f64()))
            }
            (MeasureComparator::Decimal { scale }, MeasureValue::Int64(v)) => {
                let scale = (*scale).max(0);
                let value = 10i128
                    .checked_pow(u32::from(scale.unsigned_abs()))
                    .and_then(|factor| i128::from(v).checked_mul(factor))?;
                Some(MeasureValue::Decimal128 { value, scale })
            }
            (MeasureComparator::Timestamp, MeasureValue::Int64(v)) => {
                Some(MeasureValue::Timestamp(v))
            }
            _ => None,
        }
    }

    /// Order two values of this comparator's family.
    #[must_use]
    pub fn compare(&self, left: &MeasureValue, right: &MeasureValue) -> Ordering {
        if let Some(ordering) = compare_same_family(left, right) {
            return ordering;
        }
        match (self.coerce(*left), self.coerce(*right)) {
            (Some(left), Some(right)) => compare_same_family(&left, &right)
                .unwrap_or_else(|| left.as_f64().total_cmp(&right.as_f64())),
            _ => left.as_f64().total_cmp(&right.as_f64()),
        }
    }
}

fn compare_same_family(left: &MeasureValue, right: &MeasureValue) -> Option<Ordering> {
    match (*left, *right) {
        (MeasureValue::Int64(l), MeasureValue::Int64(r))
        | (MeasureValue::Timestamp(l), MeasureValue::Timestamp(r)) => Some(l.cmp(&r)),
        (MeasureValue::Date32(l), MeasureValue::Date32(r)) => Some(l.cmp(&r)),
        (MeasureValue::Float64(l), MeasureValue::Float64(r)) => Some(l.total_cmp(&r)),
        (
            MeasureValue::Decimal128 {
                value: l,
                scale: ls,
            },
            MeasureValue::Decimal128 {
                value: r,
                scale: rs,
            },
        ) => Some(compare_decimal(l, ls, r, rs)),
        _ => None,
    }
}

fn compare_decimal(left: i128, left_scale: i8, right: i128, right_scale: i8) -> Ordering {
    if left_scale == right_scale {
        return left.cmp(&right);
    }
    let diff = u32::from((i16::from(left_scale) - i16::from(right_scale)).unsigned_abs());
    let rescaled = 10i128.checked_pow(diff).and_then(|factor| {
        if left_scale > right_scale {
            right.checked_mul(factor).map(|right| (left, right))
        } else {
            left.checked_mul(factor).map(|left| (left, right))
        }
    });
    match rescaled {
        Some((left, right)) => left.cmp(&right),
        None => {
            let left = left as f64 / 10f64.powi(left_scale.into());
            let right = right as f64 / 10f64.powi(right_scale.into());
            left.total_cmp(&right)
        }
    }
}
