use std::sync::Arc;

use arrow::datatypes::DataType;
use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rangefilter::{
    chunk::{
        memory::{MemoryBlock, MemoryChunk},
        BlockChunks,
    },
    page::DimensionPage,
    schema::{DimensionColumn, SegmentLayout},
    value::{codec, MeasureValue},
    FilterExecutor, FilterOptions, FilterTarget, LessThanFilter,
};

const RNG_SEED: u64 = 3_141_592;

fn encode(value: i64) -> Bytes {
    codec::encode_primitive(&MeasureValue::Int64(value), &DataType::Int64).unwrap()
}

fn filter(sort_column: bool) -> LessThanFilter {
    let column = DimensionColumn::new("id", 0, DataType::Int64).with_sort_column(sort_column);
    LessThanFilter::try_new(
        FilterTarget::Dimension {
            column,
            bounds: vec![encode(0)],
        },
        &SegmentLayout::new().with_dimension(0, 0),
    )
    .unwrap()
    .with_options(FilterOptions::default().verify_sorted_pages(false))
}

fn block(rows: usize, sorted: bool) -> Arc<MemoryBlock> {
    let mut rng = fastrand::Rng::with_seed(RNG_SEED);
    let mut values: Vec<Bytes> = (0..rows)
        .map(|_| encode(rng.i64(-1_000_000..1_000_000)))
        .collect();
    if sorted {
        values.sort();
    }
    let page = DimensionPage::from_values(&values).with_sorted(sorted);
    Arc::new(MemoryBlock::new(rows, 1).with_dimension_chunk(MemoryChunk::new(vec![page])))
}

fn dimension_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("less_than_page");

    for rows in [1_024, 32_000] {
        let sorted = block(rows, true);
        let carve = filter(true);
        group.bench_with_input(BenchmarkId::new("carve", rows), &rows, |b, _| {
            b.iter(|| carve.apply_filter(&BlockChunks::new(sorted.clone())).unwrap());
        });

        let linear = filter(false);
        group.bench_with_input(BenchmarkId::new("linear", rows), &rows, |b, _| {
            b.iter(|| linear.apply_filter(&BlockChunks::new(sorted.clone())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, dimension_page);
criterion_main!(benches);
