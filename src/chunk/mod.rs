//! Chunk acquisition boundary.
//!
//! A block stores one raw chunk per column. Reading a chunk is the only I/O the
//! filter ever triggers; decoding a page out of a chunk is delegated to a
//! [`PageDecoder`]. Both steps are memoized: chunks on the per-scan
//! [`BlockChunks`] handle and decoded pages on the chunk itself, each slot
//! initialized at most once.

mod error;
pub mod memory;

use std::{fmt, sync::Arc};

use arrow::array::{Array, BinaryArray};
use bytes::Bytes;
use once_cell::sync::OnceCell;

pub use self::error::ChunkError;
use crate::{
    observability::log_trace,
    page::{ColumnPage, DimensionPage, MeasurePage},
};

/// Column family a chunk belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Encoded dimension column.
    Dimension,
    /// Typed measure column.
    Measure,
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkKind::Dimension => f.write_str("dimension"),
            ChunkKind::Measure => f.write_str("measure"),
        }
    }
}

/// Decodes pages out of a raw chunk.
pub trait PageDecoder<P>: Send + Sync {
    /// Decode one page.
    fn decode_page(&self, page: usize) -> Result<P, ChunkError>;
}

/// Per-page min/max statistics recorded in a raw chunk.
#[derive(Clone, Debug, Default)]
pub struct PageStatistics {
    min_values: Option<Vec<Bytes>>,
    max_values: Option<Vec<Bytes>>,
    min_max_set: Vec<bool>,
}

impl PageStatistics {
    /// No statistics were written for the chunk.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Statistics written for every page.
    #[must_use]
    pub fn new(min_values: Vec<Bytes>, max_values: Vec<Bytes>) -> Self {
        let min_max_set = vec![true; min_values.len()];
        Self {
            min_values: Some(min_values),
            max_values: Some(max_values),
            min_max_set,
        }
    }

    /// Override which pages had statistics written.
    #[must_use]
    pub fn with_min_max_set(self, min_max_set: Vec<bool>) -> Self {
        Self {
            min_max_set,
            ..self
        }
    }

    /// True when the chunk carries a min array at all.
    #[must_use]
    pub fn has_min_values(&self) -> bool {
        self.min_values.is_some()
    }

    /// Min value of a page.
    #[must_use]
    pub fn min_value(&self, page: usize) -> Option<&[u8]> {
        self.min_values
            .as_ref()
            .and_then(|values| values.get(page))
            .map(Bytes::as_ref)
    }

    /// Max value of a page.
    #[must_use]
    pub fn max_value(&self, page: usize) -> Option<&[u8]> {
        self.max_values
            .as_ref()
            .and_then(|values| values.get(page))
            .map(Bytes::as_ref)
    }

    /// True when statistics were written for the page.
    #[must_use]
    pub fn is_min_max_set(&self, page: usize) -> bool {
        self.min_max_set.get(page).copied().unwrap_or(false)
    }
}

/// Block-level statistics of one column.
#[derive(Clone, Debug, Default)]
pub struct ColumnStatistics {
    min: Option<Bytes>,
    max: Option<Bytes>,
    min_max_set: bool,
}

impl ColumnStatistics {
    /// Statistics with both bounds written.
    #[must_use]
    pub fn new(min: Bytes, max: Bytes) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            min_max_set: true,
        }
    }

    /// Statistics that were not written.
    #[must_use]
    pub fn unset() -> Self {
        Self::default()
    }

    /// Stored min value.
    #[must_use]
    pub fn min(&self) -> Option<&[u8]> {
        self.min.as_deref()
    }

    /// Stored max value.
    #[must_use]
    pub fn max(&self) -> Option<&[u8]> {
        self.max.as_deref()
    }

    /// True when the statistics were written.
    #[must_use]
    pub fn is_min_max_set(&self) -> bool {
        self.min_max_set
    }
}

/// Block-level statistics indexed by chunk.
#[derive(Clone, Debug, Default)]
pub struct BlockStatistics {
    dimensions: Vec<ColumnStatistics>,
    measures: Vec<ColumnStatistics>,
}

impl BlockStatistics {
    /// Statistics for every dimension and measure chunk of a block.
    #[must_use]
    pub fn new(dimensions: Vec<ColumnStatistics>, measures: Vec<ColumnStatistics>) -> Self {
        Self {
            dimensions,
            measures,
        }
    }

    /// Statistics of a dimension chunk.
    #[must_use]
    pub fn dimension(&self, chunk_index: usize) -> Option<&ColumnStatistics> {
        self.dimensions.get(chunk_index)
    }

    /// Statistics of a measure chunk.
    #[must_use]
    pub fn measure(&self, chunk_index: usize) -> Option<&ColumnStatistics> {
        self.measures.get(chunk_index)
    }
}

/// Page-local dictionary of a chunk; keys index into `entries`.
#[derive(Clone, Debug)]
pub struct LocalDictionary {
    entries: BinaryArray,
}

impl LocalDictionary {
    /// Dictionary over encoded entries.
    #[must_use]
    pub fn new(entries: BinaryArray) -> Self {
        Self { entries }
    }

    /// Dictionary over encoded entries given as byte slices.
    pub fn from_entries<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self::new(BinaryArray::from_iter_values(entries))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry behind a key.
    #[must_use]
    pub fn entry(&self, key: u32) -> Option<&[u8]> {
        let key = key as usize;
        (key < self.entries.len()).then(|| self.entries.value(key))
    }
}

/// Raw column chunk of one block with lazily decoded pages.
pub struct RawColumnChunk<P> {
    row_counts: Vec<usize>,
    statistics: PageStatistics,
    local_dictionary: Option<LocalDictionary>,
    decoder: Box<dyn PageDecoder<P>>,
    decoded: Vec<OnceCell<Arc<P>>>,
}

/// Raw chunk of a dimension column.
pub type DimensionRawChunk = RawColumnChunk<DimensionPage>;

/// Raw chunk of a measure column.
pub type MeasureRawChunk = RawColumnChunk<MeasurePage>;

impl<P: ColumnPage> RawColumnChunk<P> {
    /// Chunk with one entry of `row_counts` per page.
    pub fn new(
        row_counts: Vec<usize>,
        statistics: PageStatistics,
        decoder: Box<dyn PageDecoder<P>>,
    ) -> Self {
        let decoded = row_counts.iter().map(|_| OnceCell::new()).collect();
        Self {
            row_counts,
            statistics,
            local_dictionary: None,
            decoder,
            decoded,
        }
    }

    /// Attach the chunk's local dictionary.
    #[must_use]
    pub fn with_local_dictionary(self, local_dictionary: LocalDictionary) -> Self {
        Self {
            local_dictionary: Some(local_dictionary),
            ..self
        }
    }

    /// Number of pages.
    #[must_use]
    pub fn pages_count(&self) -> usize {
        self.row_counts.len()
    }

    /// Rows recorded for a page.
    #[must_use]
    pub fn row_count(&self, page: usize) -> usize {
        self.row_counts.get(page).copied().unwrap_or(0)
    }

    /// Per-page statistics.
    #[must_use]
    pub fn statistics(&self) -> &PageStatistics {
        &self.statistics
    }

    /// Local dictionary, if the chunk was written with one.
    #[must_use]
    pub fn local_dictionary(&self) -> Option<&LocalDictionary> {
        self.local_dictionary.as_ref()
    }

    /// True once a page has been decoded.
    #[must_use]
    pub fn is_decoded(&self, page: usize) -> bool {
        self.decoded
            .get(page)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Decode a page, at most once per chunk.
    pub fn decode_page(&self, page: usize) -> Result<Arc<P>, ChunkError> {
        let slot = self.decoded.get(page).ok_or(ChunkError::PageOutOfRange {
            page,
            pages: self.row_counts.len(),
        })?;
        slot.get_or_try_init(|| {
            let decoded = self.decoder.decode_page(page)?;
            let expected = self.row_counts[page];
            if decoded.row_count() != expected {
                return Err(ChunkError::RowCountMismatch {
                    page,
                    expected,
                    actual: decoded.row_count(),
                });
            }
            log_trace!(
                component = "chunk",
                event = "page_decoded",
                page,
                rows = expected,
            );
            Ok(Arc::new(decoded))
        })
        .map(Arc::clone)
    }
}

impl<P> fmt::Debug for RawColumnChunk<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawColumnChunk")
            .field("row_counts", &self.row_counts)
            .field("statistics", &self.statistics)
            .field("local_dictionary", &self.local_dictionary)
            .finish_non_exhaustive()
    }
}

/// Storage block the filter reads chunks from.
pub trait DataBlock: Send + Sync {
    /// Total rows in the block.
    fn num_rows(&self) -> usize;

    /// Pages per column chunk.
    fn number_of_pages(&self) -> usize;

    /// Dimension chunks stored in the block.
    fn dimension_chunk_count(&self) -> usize;

    /// Measure chunks stored in the block.
    fn measure_chunk_count(&self) -> usize;

    /// Read a dimension chunk from storage.
    fn read_dimension_chunk(&self, chunk_index: usize) -> Result<DimensionRawChunk, ChunkError>;

    /// Read a measure chunk from storage.
    fn read_measure_chunk(&self, chunk_index: usize) -> Result<MeasureRawChunk, ChunkError>;
}

/// Per-scan handle over one block, caching every chunk read through it.
pub struct BlockChunks {
    block: Arc<dyn DataBlock>,
    dimensions: Vec<OnceCell<Arc<DimensionRawChunk>>>,
    measures: Vec<OnceCell<Arc<MeasureRawChunk>>>,
}

impl BlockChunks {
    /// Handle with nothing resident yet.
    #[must_use]
    pub fn new(block: Arc<dyn DataBlock>) -> Self {
        let dimensions = (0..block.dimension_chunk_count())
            .map(|_| OnceCell::new())
            .collect();
        let measures = (0..block.measure_chunk_count())
            .map(|_| OnceCell::new())
            .collect();
        Self {
            block,
            dimensions,
            measures,
        }
    }

    /// Block behind the handle.
    #[must_use]
    pub fn block(&self) -> &dyn DataBlock {
        self.block.as_ref()
    }

    /// Dimension chunk, read on first access.
    pub fn dimension_chunk(
        &self,
        chunk_index: usize,
    ) -> Result<Arc<DimensionRawChunk>, ChunkError> {
        let slot = self
            .dimensions
            .get(chunk_index)
            .ok_or(ChunkError::UnknownChunk {
                kind: ChunkKind::Dimension,
                index: chunk_index,
                available: self.dimensions.len(),
            })?;
        slot.get_or_try_init(|| {
            log_trace!(
                component = "chunk",
                event = "chunk_read",
                kind = %ChunkKind::Dimension,
                chunk = chunk_index,
            );
            self.block.read_dimension_chunk(chunk_index).map(Arc::new)
        })
        .map(Arc::clone)
    }

    /// Measure chunk, read on first access.
    pub fn measure_chunk(&self, chunk_index: usize) -> Result<Arc<MeasureRawChunk>, ChunkError> {
        let slot = self
            .measures
            .get(chunk_index)
            .ok_or(ChunkError::UnknownChunk {
                kind: ChunkKind::Measure,
                index: chunk_index,
                available: self.measures.len(),
            })?;
        slot.get_or_try_init(|| {
            log_trace!(
                component = "chunk",
                event = "chunk_read",
                kind = %ChunkKind::Measure,
                chunk = chunk_index,
            );
            self.block.read_measure_chunk(chunk_index).map(Arc::new)
        })
        .map(Arc::clone)
    }

    /// True once the chunk has been read through this handle.
    #[must_use]
    pub fn is_resident(&self, kind: ChunkKind, chunk_index: usize) -> bool {
        match kind {
            ChunkKind::Dimension => self
                .dimensions
                .get(chunk_index)
                .is_some_and(|slot| slot.get().is_some()),
            ChunkKind::Measure => self
                .measures
                .get(chunk_index)
                .is_some_and(|slot| slot.get().is_some()),
        }
    }
}

impl fmt::Debug for BlockChunks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockChunks")
            .field("rows", &self.block.num_rows())
            .field("pages", &self.block.number_of_pages())
            .finish_non_exhaustive()
    }
}
