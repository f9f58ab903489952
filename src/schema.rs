//! Column metadata consumed by the filter.
//!
//! The schema itself is owned elsewhere; the filter only needs the logical
//! type, the declared default and where the column's chunk lives in a block.

use std::{collections::HashMap, sync::Arc};

use arrow::datatypes::DataType;
use bytes::Bytes;

/// Encoding family of a dimension column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DimensionKind {
    /// UTF-8 bytes; null stored as the member default.
    String,
    /// Direct dictionary date surrogates.
    Date,
    /// Order preserving fixed width numerics.
    Primitive,
}

impl DimensionKind {
    /// Encoding family used for a logical type.
    #[must_use]
    pub fn of(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Binary | DataType::LargeBinary => {
                Some(DimensionKind::String)
            }
            DataType::Date32 => Some(DimensionKind::Date),
            DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
            | DataType::Timestamp(_, _) => Some(DimensionKind::Primitive),
            _ => None,
        }
    }
}

/// Dimension column descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimensionColumn {
    name: Arc<str>,
    ordinal: usize,
    data_type: DataType,
    default_value: Option<Bytes>,
    sort_column: bool,
}

impl DimensionColumn {
    /// Column without a default that is not part of the sort key.
    pub fn new(name: impl Into<Arc<str>>, ordinal: usize, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            ordinal,
            data_type,
            default_value: None,
            sort_column: false,
        }
    }

    /// Encoded value reported for blocks written before the column existed.
    #[must_use]
    pub fn with_default_value(self, default_value: Bytes) -> Self {
        Self {
            default_value: Some(default_value),
            ..self
        }
    }

    /// Mark the column as part of the sort key.
    #[must_use]
    pub fn with_sort_column(self, sort_column: bool) -> Self {
        Self {
            sort_column,
            ..self
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position among the dimension columns of a row.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Logical type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Declared default, encoded.
    #[must_use]
    pub fn default_value(&self) -> Option<&Bytes> {
        self.default_value.as_ref()
    }

    /// True when the column is part of the sort key.
    #[must_use]
    pub fn is_sort_column(&self) -> bool {
        self.sort_column
    }
}

/// Measure column descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasureColumn {
    name: Arc<str>,
    ordinal: usize,
    data_type: DataType,
    default_value: Option<Bytes>,
}

impl MeasureColumn {
    /// Column without a default.
    pub fn new(name: impl Into<Arc<str>>, ordinal: usize, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            ordinal,
            data_type,
            default_value: None,
        }
    }

    /// Default in the measure statistics encoding; empty bytes mean null.
    #[must_use]
    pub fn with_default_value(self, default_value: Bytes) -> Self {
        Self {
            default_value: Some(default_value),
            ..self
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position among the measure columns of a row.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Logical type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Declared default, encoded.
    #[must_use]
    pub fn default_value(&self) -> Option<&Bytes> {
        self.default_value.as_ref()
    }
}

/// Where each column's chunk sits in the blocks of a segment.
///
/// A column without an entry was added after the segment was written.
#[derive(Clone, Debug, Default)]
pub struct SegmentLayout {
    dimension_chunks: HashMap<usize, usize>,
    measure_chunks: HashMap<usize, usize>,
}

impl SegmentLayout {
    /// Layout with no columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a dimension ordinal to its chunk index.
    #[must_use]
    pub fn with_dimension(mut self, ordinal: usize, chunk_index: usize) -> Self {
        self.dimension_chunks.insert(ordinal, chunk_index);
        self
    }

    /// Map a measure ordinal to its chunk index.
    #[must_use]
    pub fn with_measure(mut self, ordinal: usize, chunk_index: usize) -> Self {
        self.measure_chunks.insert(ordinal, chunk_index);
        self
    }

    /// Chunk index of a dimension column, if present.
    #[must_use]
    pub fn dimension_chunk(&self, ordinal: usize) -> Option<usize> {
        self.dimension_chunks.get(&ordinal).copied()
    }

    /// Chunk index of a measure column, if present.
    #[must_use]
    pub fn measure_chunk(&self, ordinal: usize) -> Option<usize> {
        self.measure_chunks.get(&ordinal).copied()
    }
}
