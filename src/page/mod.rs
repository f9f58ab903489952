//! Decoded column pages.
//!
//! Pages are produced by the decode layer and only read here. A dimension page
//! keeps its values in storage order; when the page carries an
//! [`InvertedIndex`] storage order is sorted and the index maps each storage
//! position back to the row it came from. Measure pages are plain arrow arrays
//! whose validity bitmap marks null rows.

mod search;

use arrow::{
    array::{Array, ArrayRef, AsArray, BinaryArray, UInt32Array},
    buffer::ScalarBuffer,
    datatypes::{
        ArrowPrimitiveType, DataType, Date32Type, Decimal128Type, Float32Type, Float64Type,
        Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType,
        TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
        UInt32Type, UInt8Type,
    },
};

pub(crate) use self::search::{search, Bias, SearchResult};
use crate::{chunk::ChunkError, value::codec::CodecError, value::MeasureValue};

/// Behaviour shared by every decoded page.
pub trait ColumnPage: Send + Sync {
    /// Number of rows held by the page.
    fn row_count(&self) -> usize;
}

/// Permutation between sorted storage positions and original rows.
#[derive(Clone, Debug)]
pub struct InvertedIndex {
    rows: ScalarBuffer<u32>,
    positions: ScalarBuffer<u32>,
}

impl InvertedIndex {
    /// Build from `rows[position] = row`, rejecting anything that is not a permutation.
    pub fn try_new(rows: Vec<u32>) -> Result<Self, ChunkError> {
        let invalid = || ChunkError::InvalidInvertedIndex { rows: rows.len() };
        let mut positions = vec![u32::MAX; rows.len()];
        for (position, row) in rows.iter().enumerate() {
            let slot = positions.get_mut(*row as usize).ok_or_else(invalid)?;
            if *slot != u32::MAX {
                return Err(invalid());
            }
            *slot = u32::try_from(position).map_err(|_| invalid())?;
        }
        Ok(Self {
            rows: ScalarBuffer::from(rows),
            positions: ScalarBuffer::from(positions),
        })
    }

    /// Row stored at a sorted position.
    #[inline]
    #[must_use]
    pub fn row(&self, position: usize) -> usize {
        self.rows[position] as usize
    }

    /// Sorted position of a row.
    #[inline]
    #[must_use]
    pub fn position(&self, row: usize) -> usize {
        self.positions[row] as usize
    }

    /// Number of rows covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the index covers no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Storage position to row translation used while carving sorted pages.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RowLookup<'a> {
    Identity,
    Inverted(&'a InvertedIndex),
}

impl RowLookup<'_> {
    #[inline]
    pub(crate) fn row(&self, position: usize) -> usize {
        match self {
            RowLookup::Identity => position,
            RowLookup::Inverted(index) => index.row(position),
        }
    }
}

/// Decoded page of an encoded dimension column.
#[derive(Clone, Debug)]
pub struct DimensionPage {
    values: BinaryArray,
    inverted: Option<InvertedIndex>,
    sorted: bool,
    no_dictionary: bool,
    adaptive: bool,
    local_keys: Option<UInt32Array>,
}

impl DimensionPage {
    /// Page over values already in row order.
    #[must_use]
    pub fn new(values: BinaryArray) -> Self {
        Self {
            values,
            inverted: None,
            sorted: false,
            no_dictionary: true,
            adaptive: false,
            local_keys: None,
        }
    }

    /// Page over encoded values given in row order.
    pub fn from_values<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self::new(BinaryArray::from_iter_values(values))
    }

    /// Sort row-ordered values into storage order and attach the inverted index.
    ///
    /// Fails when the page has more rows than a `u32` can address.
    pub fn sorted_with_inverted_index<T>(values: &[T]) -> Result<Self, ChunkError>
    where
        T: AsRef<[u8]>,
    {
        let rows = u32::try_from(values.len())
            .map_err(|_| ChunkError::InvalidInvertedIndex { rows: values.len() })?;
        let mut order: Vec<u32> = (0..rows).collect();
        order.sort_by(|l, r| values[*l as usize].as_ref().cmp(values[*r as usize].as_ref()));
        let storage = BinaryArray::from_iter_values(order.iter().map(|row| &values[*row as usize]));
        Self::new(storage).with_inverted_index(InvertedIndex::try_new(order)?)
    }

    /// Attach an inverted index; `self`'s values must then be in storage order.
    pub fn with_inverted_index(self, index: InvertedIndex) -> Result<Self, ChunkError> {
        if index.len() != self.values.len() {
            return Err(ChunkError::InvalidInvertedIndex {
                rows: self.values.len(),
            });
        }
        Ok(Self {
            inverted: Some(index),
            sorted: true,
            ..self
        })
    }

    /// Mark whether storage order is non-decreasing without an inverted index.
    #[must_use]
    pub fn with_sorted(self, sorted: bool) -> Self {
        Self { sorted, ..self }
    }

    /// Mark whether the page stores raw values rather than dictionary surrogates.
    #[must_use]
    pub fn with_no_dictionary(self, no_dictionary: bool) -> Self {
        Self {
            no_dictionary,
            ..self
        }
    }

    /// Mark whether the page uses fixed-length adaptive numeric encoding.
    #[must_use]
    pub fn with_adaptive(self, adaptive: bool) -> Self {
        Self { adaptive, ..self }
    }

    /// Attach per-row keys into the chunk's local dictionary.
    pub fn with_local_keys(self, keys: UInt32Array) -> Result<Self, ChunkError> {
        if keys.len() != self.values.len() {
            return Err(ChunkError::Decode(format!(
                "{} local dictionary keys for {} rows",
                keys.len(),
                self.values.len()
            )));
        }
        Ok(Self {
            local_keys: Some(keys),
            ..self
        })
    }

    /// Value at a storage position.
    #[inline]
    #[must_use]
    pub fn value_at(&self, position: usize) -> &[u8] {
        self.values.value(position)
    }

    /// Value of a row.
    #[inline]
    #[must_use]
    pub fn row_value(&self, row: usize) -> &[u8] {
        match &self.inverted {
            Some(index) => self.values.value(index.position(row)),
            None => self.values.value(row),
        }
    }

    /// Inverted index, present only on explicitly sorted pages.
    #[must_use]
    pub fn inverted_index(&self) -> Option<&InvertedIndex> {
        self.inverted.as_ref()
    }

    /// True when the page carries an inverted index.
    #[must_use]
    pub fn is_explicit_sorted(&self) -> bool {
        self.inverted.is_some()
    }

    /// True when storage order is non-decreasing.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted || self.inverted.is_some()
    }

    /// True when values are raw bytes rather than dictionary surrogates.
    #[must_use]
    pub fn is_no_dictionary(&self) -> bool {
        self.no_dictionary
    }

    /// True for fixed-length adaptive numeric pages.
    #[must_use]
    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// True when rows carry local dictionary keys.
    #[must_use]
    pub fn has_local_keys(&self) -> bool {
        self.local_keys.is_some()
    }

    /// Local dictionary key of a row.
    #[must_use]
    pub fn local_key(&self, row: usize) -> Option<u32> {
        self.local_keys
            .as_ref()
            .filter(|keys| keys.is_valid(row))
            .map(|keys| keys.value(row))
    }

    /// First storage position whose value is below its predecessor.
    pub(crate) fn first_unsorted_position(&self) -> Option<usize> {
        (1..self.values.len())
            .find(|position| self.value_at(position - 1) > self.value_at(*position))
    }
}

impl ColumnPage for DimensionPage {
    fn row_count(&self) -> usize {
        self.values.len()
    }
}

/// Decoded page of a measure column.
#[derive(Clone, Debug)]
pub struct MeasurePage {
    values: ArrayRef,
}

impl MeasurePage {
    /// Wrap a decoded arrow array.
    #[must_use]
    pub fn new(values: ArrayRef) -> Self {
        Self { values }
    }

    /// Underlying arrow array.
    #[must_use]
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// True when the row holds a null.
    #[inline]
    #[must_use]
    pub fn is_null(&self, row: usize) -> bool {
        self.values.is_null(row)
    }

    /// Number of null rows.
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.values.null_count()
    }
}

impl ColumnPage for MeasurePage {
    fn row_count(&self) -> usize {
        self.values.len()
    }
}

/// Typed view over the native values of a measure page.
#[derive(Clone, Copy, Debug)]
pub(crate) enum MeasureValues<'a> {
    Int8(&'a [i8]),
    Int16(&'a [i16]),
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    UInt8(&'a [u8]),
    UInt16(&'a [u16]),
    UInt32(&'a [u32]),
    Float32(&'a [f32]),
    Float64(&'a [f64]),
    Decimal128(&'a [i128], i8),
    Date32(&'a [i32]),
    Timestamp(&'a [i64]),
}

impl<'a> MeasureValues<'a> {
    pub(crate) fn try_new(page: &'a MeasurePage) -> Result<Self, CodecError> {
        let array: &'a dyn Array = &*page.values;
        let values = match array.data_type() {
            DataType::Int8 => MeasureValues::Int8(native::<Int8Type>(array)?),
            DataType::Int16 => MeasureValues::Int16(native::<Int16Type>(array)?),
            DataType::Int32 => MeasureValues::Int32(native::<Int32Type>(array)?),
            DataType::Int64 => MeasureValues::Int64(native::<Int64Type>(array)?),
            DataType::UInt8 => MeasureValues::UInt8(native::<UInt8Type>(array)?),
            DataType::UInt16 => MeasureValues::UInt16(native::<UInt16Type>(array)?),
            DataType::UInt32 => MeasureValues::UInt32(native::<UInt32Type>(array)?),
            DataType::Float32 => MeasureValues::Float32(native::<Float32Type>(array)?),
            DataType::Float64 => MeasureValues::Float64(native::<Float64Type>(array)?),
            DataType::Decimal128(_, scale) => {
                MeasureValues::Decimal128(native::<Decimal128Type>(array)?, *scale)
            }
            DataType::Date32 => MeasureValues::Date32(native::<Date32Type>(array)?),
            DataType::Timestamp(unit, _) => MeasureValues::Timestamp(match unit {
                TimeUnit::Second => native::<TimestampSecondType>(array)?,
                TimeUnit::Millisecond => native::<TimestampMillisecondType>(array)?,
                TimeUnit::Microsecond => native::<TimestampMicrosecondType>(array)?,
                TimeUnit::Nanosecond => native::<TimestampNanosecondType>(array)?,
            }),
            other => return Err(CodecError::UnsupportedType(other.clone())),
        };
        Ok(values)
    }

    /// Value of a row; meaningless for null rows.
    #[inline]
    pub(crate) fn value(&self, row: usize) -> MeasureValue {
        match *self {
            MeasureValues::Int8(values) => MeasureValue::Int64(i64::from(values[row])),
            MeasureValues::Int16(values) => MeasureValue::Int64(i64::from(values[row])),
            MeasureValues::Int32(values) => MeasureValue::Int64(i64::from(values[row])),
            MeasureValues::Int64(values) => MeasureValue::Int64(values[row]),
            MeasureValues::UInt8(values) => MeasureValue::Int64(i64::from(values[row])),
            MeasureValues::UInt16(values) => MeasureValue::Int64(i64::from(values[row])),
            MeasureValues::UInt32(values) => MeasureValue::Int64(i64::from(values[row])),
            MeasureValues::Float32(values) => MeasureValue::Float64(f64::from(values[row])),
            MeasureValues::Float64(values) => MeasureValue::Float64(values[row]),
            MeasureValues::Decimal128(values, scale) => MeasureValue::Decimal128 {
                value: values[row],
                scale,
            },
            MeasureValues::Date32(values) => MeasureValue::Date32(values[row]),
            MeasureValues::Timestamp(values) => MeasureValue::Timestamp(values[row]),
        }
    }
}

fn native<T: ArrowPrimitiveType>(array: &dyn Array) -> Result<&[T::Native], CodecError> {
    array
        .as_primitive_opt::<T>()
        .map(|array| &array.values()[..])
        .ok_or_else(|| CodecError::UnsupportedType(array.data_type().clone()))
}
