#![allow(dead_code)]

use std::sync::Arc;

use arrow::{buffer::BooleanBuffer, datatypes::DataType};
use bytes::Bytes;
use rangefilter::{
    chunk::{
        memory::{MemoryBlock, MemoryChunk},
        BlockChunks,
    },
    page::{ColumnPage, DimensionPage},
    schema::{DimensionColumn, SegmentLayout},
    value::{codec, MeasureValue},
    FilterTarget, LessThanFilter,
};

pub const RNG_SEED: u64 = 3_141_592;

pub fn make_rng() -> fastrand::Rng {
    fastrand::Rng::with_seed(RNG_SEED)
}

pub fn int32(value: i64) -> Bytes {
    codec::encode_primitive(&MeasureValue::Int64(value), &DataType::Int32).expect("encode int32")
}

pub fn date(days: i32) -> Bytes {
    codec::encode_date(days).expect("encode date")
}

pub fn selected(mask: &BooleanBuffer) -> Vec<usize> {
    mask.set_indices().collect()
}

pub fn chunks(block: &Arc<MemoryBlock>) -> BlockChunks {
    BlockChunks::new(block.clone())
}

/// Block with a single dimension chunk at index 0.
pub fn dimension_block(pages: Vec<DimensionPage>) -> Arc<MemoryBlock> {
    let rows = pages.iter().map(|page| page.row_count()).sum();
    let count = pages.len();
    Arc::new(MemoryBlock::new(rows, count).with_dimension_chunk(MemoryChunk::new(pages)))
}

pub fn dimension_filter(column: DimensionColumn, bounds: Vec<Bytes>) -> LessThanFilter {
    let layout = SegmentLayout::new().with_dimension(column.ordinal(), 0);
    LessThanFilter::try_new(FilterTarget::Dimension { column, bounds }, &layout)
        .expect("dimension filter")
}
