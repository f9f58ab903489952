use thiserror::Error;

use crate::chunk::ChunkKind;

/// Errors raised while acquiring raw chunks or decoding their pages.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Reading the chunk from storage failed.
    #[error("chunk read failed: {0}")]
    Io(#[from] std::io::Error),
    /// The block has no chunk at the requested index.
    #[error("unknown {kind} chunk {index} (block has {available})")]
    UnknownChunk {
        /// Dimension or measure.
        kind: ChunkKind,
        /// Requested chunk index.
        index: usize,
        /// Chunks present in the block.
        available: usize,
    },
    /// The chunk has no page at the requested index.
    #[error("page {page} out of range ({pages} pages)")]
    PageOutOfRange {
        /// Requested page.
        page: usize,
        /// Pages present in the chunk.
        pages: usize,
    },
    /// The decoded page disagrees with the row count recorded for it.
    #[error("page {page} decoded {actual} rows, chunk declares {expected}")]
    RowCountMismatch {
        /// Page index.
        page: usize,
        /// Rows recorded in the chunk.
        expected: usize,
        /// Rows found after decoding.
        actual: usize,
    },
    /// The inverted index is not a permutation of the page's rows.
    #[error("inverted index is not a permutation of {rows} rows")]
    InvalidInvertedIndex {
        /// Rows the index should cover.
        rows: usize,
    },
    /// The decode layer rejected the page.
    #[error("page decode failed: {0}")]
    Decode(String),
}
