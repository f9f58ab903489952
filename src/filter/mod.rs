//! Range filter executors.
//!
//! A filter is built once per predicate and then evaluated against many
//! blocks, possibly concurrently. Evaluation happens at three granularities:
//! block statistics, per-page row masks and single materialized rows.

mod bitset;
mod dictionary;
mod less_than;
mod predicate;
mod prune;
mod row;

use arrow::{buffer::BooleanBuffer, datatypes::DataType};
use thiserror::Error;

pub use self::{
    less_than::LessThanFilter,
    predicate::FilterTarget,
    row::{MaterializedRow, RowCell, RowView},
};
use crate::{
    bitmask::BitmaskGroup,
    chunk::{BlockChunks, BlockStatistics, ChunkError},
    value::codec::CodecError,
};

/// Errors raised while building or evaluating a filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A chunk could not be read or decoded.
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    /// A bound, statistic or default could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The column type has no ordering here.
    #[error("column '{column}' of type {data_type:?} cannot be range filtered")]
    UnsupportedType {
        /// Column name.
        column: String,
        /// Declared logical type.
        data_type: DataType,
    },
    /// A bound does not fit the column's type.
    #[error("bound {bound} does not fit column '{column}'")]
    BoundTypeMismatch {
        /// Column name.
        column: String,
        /// Rendered offending bound.
        bound: String,
    },
    /// A page marked sorted is not in non-decreasing order.
    #[error("page {page} is not sorted at storage position {position}")]
    UnsortedPage {
        /// Page index in the chunk.
        page: usize,
        /// First out-of-order storage position.
        position: usize,
    },
}

/// Evaluates one predicate against blocks and rows.
pub trait FilterExecutor: Send + Sync {
    /// Decide from block-level statistics whether the block may hold matches.
    fn is_block_scan_required(&self, statistics: &BlockStatistics) -> Result<bool, FilterError>;

    /// One bit per page: set when the page may hold matches.
    fn prune_pages(&self, chunks: &BlockChunks) -> Result<BooleanBuffer, FilterError>;

    /// Row masks of every page of the block; pruned pages stay unset.
    fn apply_filter(&self, chunks: &BlockChunks) -> Result<BitmaskGroup, FilterError>;

    /// Evaluate a single row. Measure cells sit after the `dim_ordinal_max`
    /// dimension cells.
    fn apply_row(&self, row: &dyn RowView, dim_ordinal_max: usize) -> bool;

    /// Make the chunks the filter needs resident on the handle.
    fn read_column_chunks(&self, chunks: &BlockChunks) -> Result<(), FilterError>;
}
