mod common;

use std::sync::Arc;

use arrow::{
    array::{Int64Array, UInt32Array},
    datatypes::DataType,
};
use bytes::Bytes;
use common::{chunks, date, dimension_block, dimension_filter, int32, selected};
use rangefilter::{
    chunk::{
        memory::{MemoryBlock, MemoryChunk},
        BlockStatistics, ChunkError, ChunkKind, ColumnStatistics, LocalDictionary, PageStatistics,
    },
    filter::{MaterializedRow, RowCell},
    page::{DimensionPage, MeasurePage},
    schema::{DimensionColumn, MeasureColumn, SegmentLayout},
    value::{codec, MeasureValue},
    FilterError, FilterExecutor, FilterOptions, FilterTarget, LessThanFilter,
};

fn measure_filter(bounds: Vec<Option<MeasureValue>>) -> LessThanFilter {
    let layout = SegmentLayout::new().with_measure(0, 0);
    LessThanFilter::try_new(
        FilterTarget::Measure {
            column: MeasureColumn::new("qty", 0, DataType::Int64),
            bounds,
        },
        &layout,
    )
    .expect("measure filter")
}

fn measure_block(values: Vec<Option<i64>>) -> Arc<MemoryBlock> {
    let rows = values.len();
    let page = MeasurePage::new(Arc::new(Int64Array::from(values)));
    Arc::new(MemoryBlock::new(rows, 1).with_measure_chunk(MemoryChunk::new(vec![page])))
}

#[test]
fn sorted_dictionary_dimension_carves_below_bound() {
    let days = [10, 20, 20, 30, 40];
    let page = DimensionPage::from_values(days.iter().map(|d| date(*d)))
        .with_sorted(true)
        .with_no_dictionary(false);
    let column = DimensionColumn::new("day", 0, DataType::Date32).with_sort_column(true);
    let filter = dimension_filter(column.clone(), vec![date(20)]);
    let block = dimension_block(vec![page]);
    let group = filter.apply_filter(&chunks(&block)).expect("filter");
    assert_eq!(group.selected(0), vec![0]);

    let rows: Vec<Bytes> = [30, 10, 20, 40, 20].iter().map(|d| date(*d)).collect();
    let page = DimensionPage::sorted_with_inverted_index(&rows)
        .expect("index")
        .with_no_dictionary(false);
    let filter = dimension_filter(column, vec![date(20)]);
    let block = dimension_block(vec![page]);
    let group = filter.apply_filter(&chunks(&block)).expect("filter");
    assert_eq!(group.selected(0), vec![1]);
}

#[test]
fn invalid_statistics_keep_page() {
    let column = DimensionColumn::new("id", 0, DataType::Int32);
    let filter = dimension_filter(column, vec![int32(10)]);
    let page = DimensionPage::from_values([int32(50), int32(60)]);
    let statistics = PageStatistics::new(vec![int32(50)], vec![int32(60)]);

    let block = Arc::new(MemoryBlock::new(2, 1).with_dimension_chunk(
        MemoryChunk::new(vec![page.clone()])
            .with_statistics(statistics.clone().with_min_max_set(vec![false])),
    ));
    let keep = filter.prune_pages(&chunks(&block)).expect("prune");
    assert_eq!(selected(&keep), vec![0]);

    let block = Arc::new(
        MemoryBlock::new(2, 1)
            .with_dimension_chunk(MemoryChunk::new(vec![page]).with_statistics(statistics)),
    );
    let keep = filter.prune_pages(&chunks(&block)).expect("prune");
    assert!(selected(&keep).is_empty());
    let group = filter.apply_filter(&chunks(&block)).expect("filter");
    assert!(group.page(0).is_none());
    assert_eq!(block.page_decodes(), 0);
}

#[test]
fn measure_null_bound_selects_null_rows() {
    let block = measure_block(vec![Some(5), None, Some(15)]);

    let filter = measure_filter(vec![Some(MeasureValue::Int64(10)), None]);
    let group = filter.apply_filter(&chunks(&block)).expect("filter");
    assert_eq!(group.selected(0), vec![0, 1]);

    let filter = measure_filter(vec![Some(MeasureValue::Int64(10))]);
    let group = filter.apply_filter(&chunks(&block)).expect("filter");
    assert_eq!(group.selected(0), vec![0]);
}

#[test]
fn absent_column_uses_default_without_reading() {
    let layout = SegmentLayout::new();
    let column = MeasureColumn::new("qty", 3, DataType::Int64)
        .with_default_value(codec::encode_measure(&MeasureValue::Int64(50)));
    let filter = LessThanFilter::try_new(
        FilterTarget::Measure {
            column,
            bounds: vec![Some(MeasureValue::Int64(100))],
        },
        &layout,
    )
    .expect("filter");
    assert!(filter.is_column_absent());
    assert!(filter.absent_default_matches());

    let block = Arc::new(MemoryBlock::new(40_000, 2));
    let handle = chunks(&block);
    let keep = filter.prune_pages(&handle).expect("prune");
    assert_eq!(keep.count_set_bits(), 2);
    let group = filter.apply_filter(&handle).expect("filter");
    assert_eq!(group.page_count(), 2);
    assert_eq!(group.page(1).map(|mask| mask.len()), Some(8_000));
    assert_eq!(group.selected_rows(), 40_000);
    filter.read_column_chunks(&handle).expect("read");
    assert_eq!(block.chunk_reads(), 0);
    assert!(filter.apply_row(&MaterializedRow::default(), 0));
    assert!(filter
        .is_block_scan_required(&BlockStatistics::default())
        .expect("block"));

    let filter = LessThanFilter::try_new(
        FilterTarget::Dimension {
            column: DimensionColumn::new("id", 1, DataType::Int32).with_default_value(int32(50)),
            bounds: vec![int32(20)],
        },
        &layout,
    )
    .expect("filter")
    .with_options(FilterOptions::default().rows_per_page(10_000));
    let group = filter.apply_filter(&handle).expect("filter");
    assert_eq!(group.page_count(), 2);
    assert_eq!(group.page(1).map(|mask| mask.len()), Some(30_000));
    assert_eq!(group.selected_rows(), 0);
    assert!(!filter.apply_row(&MaterializedRow::default(), 0));
}

#[test]
fn absent_column_group_follows_block_pages() {
    let filter = LessThanFilter::try_new(
        FilterTarget::Dimension {
            column: DimensionColumn::new("id", 1, DataType::Int32).with_default_value(int32(5)),
            bounds: vec![int32(20)],
        },
        &SegmentLayout::new(),
    )
    .expect("filter");
    let block = Arc::new(MemoryBlock::new(100, 4));
    let handle = chunks(&block);
    let keep = filter.prune_pages(&handle).expect("prune");
    let group = filter.apply_filter(&handle).expect("filter");
    assert_eq!(keep.len(), 4);
    assert_eq!(group.page_count(), keep.len());
    assert_eq!(group.selected_rows(), 100);
}

#[test]
fn unsorted_dimension_scans_linearly() {
    let values = [30, 10, 40, 20];
    let page = DimensionPage::from_values(values.iter().map(|v| int32(*v)));
    let column = DimensionColumn::new("id", 0, DataType::Int32);
    let filter = dimension_filter(column, vec![int32(25)]);
    let block = dimension_block(vec![page]);
    let group = filter.apply_filter(&chunks(&block)).expect("filter");
    assert_eq!(group.selected(0), vec![1, 3]);
}

#[test]
fn repeated_filtering_is_idempotent_and_memoized() {
    let pages = vec![
        DimensionPage::from_values([int32(1), int32(9)]),
        DimensionPage::from_values([int32(3), int32(12), int32(4)]),
    ];
    let column = DimensionColumn::new("id", 0, DataType::Int32);
    let filter = dimension_filter(column, vec![int32(5)]);
    let block = dimension_block(pages);
    let handle = chunks(&block);

    filter.read_column_chunks(&handle).expect("read");
    filter.read_column_chunks(&handle).expect("read");
    assert!(handle.is_resident(ChunkKind::Dimension, 0));
    assert_eq!(block.chunk_reads(), 1);

    let first = filter.apply_filter(&handle).expect("filter");
    let second = filter.apply_filter(&handle).expect("filter");
    assert_eq!(first, second);
    assert_eq!(first.selected(1), vec![0, 2]);
    assert_eq!(block.chunk_reads(), 1);
    assert_eq!(block.page_decodes(), 2);
}

#[test]
fn read_failures_propagate() {
    let column = DimensionColumn::new("id", 0, DataType::Int32);
    let filter = dimension_filter(column, vec![int32(5)]);
    let block = dimension_block(vec![DimensionPage::from_values([int32(1)])]);
    block.fail_reads();
    let handle = chunks(&block);
    assert!(matches!(
        filter.apply_filter(&handle),
        Err(FilterError::Chunk(ChunkError::Io(_)))
    ));
    assert!(matches!(
        filter.read_column_chunks(&handle),
        Err(FilterError::Chunk(ChunkError::Io(_)))
    ));
    assert!(matches!(
        filter.prune_pages(&handle),
        Err(FilterError::Chunk(ChunkError::Io(_)))
    ));
}

#[test]
fn local_dictionary_resolves_keys() {
    let dictionary = LocalDictionary::from_entries([&b"amsterdam"[..], b"berlin", b"zurich"]);
    let keyed = DimensionPage::from_values([&b"zurich"[..], b"amsterdam", b"berlin"])
        .with_no_dictionary(false)
        .with_local_keys(UInt32Array::from(vec![2, 0, 1]))
        .expect("keys");
    let unkeyed = DimensionPage::from_values([&b"berlin"[..], b"zurich"]).with_no_dictionary(false);
    let block = Arc::new(MemoryBlock::new(5, 2).with_dimension_chunk(
        MemoryChunk::new(vec![keyed, unkeyed]).with_local_dictionary(dictionary),
    ));
    let column = DimensionColumn::new("city", 0, DataType::Utf8);
    let filter = dimension_filter(column, vec![Bytes::from_static(b"c")]);
    let group = filter.apply_filter(&chunks(&block)).expect("filter");
    assert_eq!(group.selected(0), vec![1, 2]);
    assert_eq!(group.selected(1), vec![0]);
}

#[test]
fn unsorted_page_flagged_sorted_is_reported() {
    let page = DimensionPage::from_values([int32(5), int32(1)]).with_sorted(true);
    let column = DimensionColumn::new("id", 0, DataType::Int32).with_sort_column(true);
    let block = dimension_block(vec![page]);

    let filter = dimension_filter(column.clone(), vec![int32(3)])
        .with_options(FilterOptions::default().verify_sorted_pages(true));
    assert!(matches!(
        filter.apply_filter(&chunks(&block)),
        Err(FilterError::UnsortedPage {
            page: 0,
            position: 1
        })
    ));
}

#[test]
fn block_statistics_prune_whole_block() {
    let column = DimensionColumn::new("id", 0, DataType::Int32);
    let filter = dimension_filter(column, vec![int32(10)]);
    let statistics = BlockStatistics::new(
        vec![ColumnStatistics::new(int32(10), int32(90))],
        Vec::new(),
    );
    assert!(!filter.is_block_scan_required(&statistics).expect("block"));
    let statistics = BlockStatistics::new(
        vec![ColumnStatistics::new(int32(9), int32(90))],
        Vec::new(),
    );
    assert!(filter.is_block_scan_required(&statistics).expect("block"));
    let statistics = BlockStatistics::new(vec![ColumnStatistics::unset()], Vec::new());
    assert!(filter.is_block_scan_required(&statistics).expect("block"));

    let filter = filter.with_options(FilterOptions::default().use_min_max(false));
    let statistics = BlockStatistics::new(
        vec![ColumnStatistics::new(int32(10), int32(90))],
        Vec::new(),
    );
    assert!(filter.is_block_scan_required(&statistics).expect("block"));
}

#[test]
fn row_evaluation_matches_page_semantics() {
    let filter = measure_filter(vec![Some(MeasureValue::Int64(10)), None]);
    let row = |value: Option<i64>| {
        MaterializedRow::new(vec![
            RowCell::Dimension(Bytes::from_static(b"x")),
            RowCell::Measure(value.map(MeasureValue::Int64)),
        ])
    };
    assert!(filter.apply_row(&row(Some(5)), 1));
    assert!(filter.apply_row(&row(None), 1));
    assert!(!filter.apply_row(&row(Some(15)), 1));
}
