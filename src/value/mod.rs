//! Typed scalars and their byte encodings.

pub mod codec;

/// Typed scalar held by measure columns and by decoded primitive statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeasureValue {
    /// Any signed or small unsigned integer, widened.
    Int64(i64),
    /// Floating point, widened.
    Float64(f64),
    /// Fixed point decimal: `value * 10^-scale`.
    Decimal128 {
        /// Unscaled value.
        value: i128,
        /// Number of fractional digits.
        scale: i8,
    },
    /// Days since the UNIX epoch.
    Date32(i32),
    /// Timestamp in the column's own unit.
    Timestamp(i64),
}

impl MeasureValue {
    /// Lossy view used when two values of different families have to be ordered.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            MeasureValue::Int64(v) | MeasureValue::Timestamp(v) => v as f64,
            MeasureValue::Float64(v) => v,
            MeasureValue::Decimal128 { value, scale } => value as f64 / 10f64.powi(scale.into()),
            MeasureValue::Date32(v) => f64::from(v),
        }
    }
}

impl From<i64> for MeasureValue {
    fn from(value: i64) -> Self {
        MeasureValue::Int64(value)
    }
}

impl From<f64> for MeasureValue {
    fn from(value: f64) -> Self {
        MeasureValue::Float64(value)
    }
}
