//! In-memory [`DataBlock`] holding already decoded pages.
//!
//! Used to embed the filter over data that never touched disk and to drive
//! tests and benchmarks. Chunk reads and page decodes are counted so callers
//! can observe the memoization on [`BlockChunks`](crate::chunk::BlockChunks).

use std::{
    io,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use crate::{
    chunk::{
        ChunkError, ChunkKind, DataBlock, DimensionRawChunk, LocalDictionary, MeasureRawChunk,
        PageDecoder, PageStatistics, RawColumnChunk,
    },
    page::{ColumnPage, DimensionPage, MeasurePage},
};

/// Pages and statistics of one column.
#[derive(Clone, Debug)]
pub struct MemoryChunk<P> {
    pages: Arc<Vec<P>>,
    statistics: PageStatistics,
    local_dictionary: Option<LocalDictionary>,
}

impl<P> MemoryChunk<P> {
    /// Chunk over decoded pages without statistics.
    #[must_use]
    pub fn new(pages: Vec<P>) -> Self {
        Self {
            pages: Arc::new(pages),
            statistics: PageStatistics::absent(),
            local_dictionary: None,
        }
    }

    /// Attach per-page statistics.
    #[must_use]
    pub fn with_statistics(self, statistics: PageStatistics) -> Self {
        Self { statistics, ..self }
    }

    /// Attach a local dictionary.
    #[must_use]
    pub fn with_local_dictionary(self, local_dictionary: LocalDictionary) -> Self {
        Self {
            local_dictionary: Some(local_dictionary),
            ..self
        }
    }
}

struct MemoryDecoder<P> {
    pages: Arc<Vec<P>>,
    decodes: Arc<AtomicUsize>,
}

impl<P: Clone + Send + Sync> PageDecoder<P> for MemoryDecoder<P> {
    fn decode_page(&self, page: usize) -> Result<P, ChunkError> {
        let decoded = self
            .pages
            .get(page)
            .cloned()
            .ok_or(ChunkError::PageOutOfRange {
                page,
                pages: self.pages.len(),
            })?;
        self.decodes.fetch_add(1, Ordering::Relaxed);
        Ok(decoded)
    }
}

/// Block whose chunks live in memory.
#[derive(Debug, Default)]
pub struct MemoryBlock {
    num_rows: usize,
    number_of_pages: usize,
    dimensions: Vec<MemoryChunk<DimensionPage>>,
    measures: Vec<MemoryChunk<MeasurePage>>,
    fail_reads: AtomicBool,
    chunk_reads: AtomicUsize,
    page_decodes: Arc<AtomicUsize>,
}

impl MemoryBlock {
    /// Empty block shape; chunks are appended in chunk-index order.
    #[must_use]
    pub fn new(num_rows: usize, number_of_pages: usize) -> Self {
        Self {
            num_rows,
            number_of_pages,
            ..Self::default()
        }
    }

    /// Append a dimension chunk; its index is the number of dimension chunks before it.
    #[must_use]
    pub fn with_dimension_chunk(mut self, chunk: MemoryChunk<DimensionPage>) -> Self {
        self.dimensions.push(chunk);
        self
    }

    /// Append a measure chunk; its index is the number of measure chunks before it.
    #[must_use]
    pub fn with_measure_chunk(mut self, chunk: MemoryChunk<MeasurePage>) -> Self {
        self.measures.push(chunk);
        self
    }

    /// Make every subsequent chunk read fail with an I/O error.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::Relaxed);
    }

    /// Chunk reads served so far.
    #[must_use]
    pub fn chunk_reads(&self) -> usize {
        self.chunk_reads.load(Ordering::Relaxed)
    }

    /// Page decodes served so far.
    #[must_use]
    pub fn page_decodes(&self) -> usize {
        self.page_decodes.load(Ordering::Relaxed)
    }

    fn read<P>(
        &self,
        kind: ChunkKind,
        chunks: &[MemoryChunk<P>],
        chunk_index: usize,
    ) -> Result<RawColumnChunk<P>, ChunkError>
    where
        P: ColumnPage + Clone + 'static,
    {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(ChunkError::Io(io::Error::other(format!(
                "{kind} chunk {chunk_index} unavailable"
            ))));
        }
        let chunk = chunks.get(chunk_index).ok_or(ChunkError::UnknownChunk {
            kind,
            index: chunk_index,
            available: chunks.len(),
        })?;
        self.chunk_reads.fetch_add(1, Ordering::Relaxed);
        let row_counts = chunk.pages.iter().map(ColumnPage::row_count).collect();
        let decoder = MemoryDecoder {
            pages: Arc::clone(&chunk.pages),
            decodes: Arc::clone(&self.page_decodes),
        };
        let raw = RawColumnChunk::new(row_counts, chunk.statistics.clone(), Box::new(decoder));
        Ok(match &chunk.local_dictionary {
            Some(dictionary) => raw.with_local_dictionary(dictionary.clone()),
            None => raw,
        })
    }
}

impl DataBlock for MemoryBlock {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn number_of_pages(&self) -> usize {
        self.number_of_pages
    }

    fn dimension_chunk_count(&self) -> usize {
        self.dimensions.len()
    }

    fn measure_chunk_count(&self) -> usize {
        self.measures.len()
    }

    fn read_dimension_chunk(&self, chunk_index: usize) -> Result<DimensionRawChunk, ChunkError> {
        self.read(ChunkKind::Dimension, &self.dimensions, chunk_index)
    }

    fn read_measure_chunk(&self, chunk_index: usize) -> Result<MeasureRawChunk, ChunkError> {
        self.read(ChunkKind::Measure, &self.measures, chunk_index)
    }
}
