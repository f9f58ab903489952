use arrow::{array::BooleanBufferBuilder, buffer::BooleanBuffer};

use crate::{
    bitmask::BitmaskGroup,
    chunk::{BlockChunks, BlockStatistics, ChunkKind, PageStatistics},
    filter::{
        bitset::RangeBitsetBuilder,
        dictionary::DictionaryFilter,
        predicate::{DimensionTarget, FilterTarget, MeasureTarget, ResolvedTarget},
        prune::MinMaxPruner,
        row::{RowPredicateEvaluator, RowView},
        FilterError, FilterExecutor,
    },
    observability::{log_debug, log_trace, log_warn},
    option::FilterOptions,
    schema::SegmentLayout,
};

/// Evaluates `column < bound` for any of a set of bounds.
///
/// ```
/// use std::sync::Arc;
///
/// use arrow::datatypes::DataType;
/// use bytes::Bytes;
/// use rangefilter::{
///     chunk::{memory::{MemoryBlock, MemoryChunk}, BlockChunks},
///     page::DimensionPage,
///     schema::{DimensionColumn, SegmentLayout},
///     FilterExecutor, FilterTarget, LessThanFilter,
/// };
///
/// let column = DimensionColumn::new("city", 0, DataType::Utf8);
/// let layout = SegmentLayout::new().with_dimension(0, 0);
/// let filter = LessThanFilter::try_new(
///     FilterTarget::Dimension { column, bounds: vec![Bytes::from_static(b"m")] },
///     &layout,
/// )?;
///
/// let block = MemoryBlock::new(3, 1).with_dimension_chunk(MemoryChunk::new(vec![
///     DimensionPage::from_values([&b"oslo"[..], b"lima", b"kyiv"]),
/// ]));
/// let group = filter.apply_filter(&BlockChunks::new(Arc::new(block)))?;
/// assert_eq!(group.selected(0), vec![1, 2]);
/// # Ok::<(), rangefilter::FilterError>(())
/// ```
#[derive(Debug)]
pub struct LessThanFilter {
    target: ResolvedTarget,
    chunk_index: Option<usize>,
    absent_default_matches: bool,
    options: FilterOptions,
}

impl LessThanFilter {
    /// Resolve the predicate against the segment's layout.
    pub fn try_new(target: FilterTarget, layout: &SegmentLayout) -> Result<Self, FilterError> {
        let chunk_index = match &target {
            FilterTarget::Dimension { column, .. } => layout.dimension_chunk(column.ordinal()),
            FilterTarget::Measure { column, .. } => layout.measure_chunk(column.ordinal()),
        };
        let target = ResolvedTarget::try_new(target)?;
        let absent_default_matches = match chunk_index {
            Some(_) => false,
            None => target.default_matches()?,
        };
        Ok(Self {
            target,
            chunk_index,
            absent_default_matches,
            options: FilterOptions::default(),
        })
    }

    /// Replace the filter's options.
    #[must_use]
    pub fn with_options(self, options: FilterOptions) -> Self {
        Self { options, ..self }
    }

    /// True when the filtered column has no chunk in this segment.
    #[must_use]
    pub fn is_column_absent(&self) -> bool {
        self.chunk_index.is_none()
    }

    /// For an absent column, whether its default satisfies the predicate.
    #[must_use]
    pub fn absent_default_matches(&self) -> bool {
        self.absent_default_matches
    }

    fn kind(&self) -> ChunkKind {
        match self.target {
            ResolvedTarget::Dimension(_) => ChunkKind::Dimension,
            ResolvedTarget::Measure(_) => ChunkKind::Measure,
        }
    }

    fn page_survives(&self, statistics: &PageStatistics, page: usize) -> Result<bool, FilterError> {
        if !self.options.use_min_max {
            return Ok(true);
        }
        MinMaxPruner::new(&self.target)
            .is_scan_required(statistics.min_value(page), statistics.is_min_max_set(page))
    }

    fn keep_pages(
        &self,
        pages: usize,
        statistics: &PageStatistics,
    ) -> Result<BooleanBuffer, FilterError> {
        let mut keep = BooleanBufferBuilder::new(pages);
        for page in 0..pages {
            let survives = self.page_survives(statistics, page)?;
            if !survives {
                log_trace!(component = "less_than", event = "page_pruned", page);
            }
            keep.append(survives);
        }
        Ok(keep.finish())
    }

    fn apply_dimension(
        &self,
        target: &DimensionTarget,
        chunks: &BlockChunks,
        chunk_index: usize,
    ) -> Result<BitmaskGroup, FilterError> {
        let chunk = chunks.dimension_chunk(chunk_index)?;
        let builder = RangeBitsetBuilder::new(self.options.verify_sorted_pages);
        let dictionary = chunk
            .local_dictionary()
            .filter(|_| self.options.use_local_dictionary)
            .map(|dictionary| DictionaryFilter::build(dictionary, target));
        let mut group = BitmaskGroup::new(chunk.pages_count());
        for page_index in 0..chunk.pages_count() {
            if !self.page_survives(chunk.statistics(), page_index)? {
                log_trace!(component = "less_than", event = "page_pruned", page = page_index);
                continue;
            }
            let page = chunk.decode_page(page_index)?;
            let mask = match &dictionary {
                Some(dictionary) if page.has_local_keys() => dictionary.filter_page(&page),
                Some(_) => {
                    log_warn!(
                        component = "less_than",
                        event = "local_keys_missing",
                        column = target.column.name(),
                        page = page_index,
                    );
                    builder.dimension_mask(target, &page, page_index)?
                }
                None => builder.dimension_mask(target, &page, page_index)?,
            };
            group.set_page(page_index, mask);
        }
        Ok(group)
    }

    fn apply_measure(
        &self,
        target: &MeasureTarget,
        chunks: &BlockChunks,
        chunk_index: usize,
    ) -> Result<BitmaskGroup, FilterError> {
        let chunk = chunks.measure_chunk(chunk_index)?;
        let builder = RangeBitsetBuilder::new(self.options.verify_sorted_pages);
        let mut group = BitmaskGroup::new(chunk.pages_count());
        for page_index in 0..chunk.pages_count() {
            if !self.page_survives(chunk.statistics(), page_index)? {
                log_trace!(component = "less_than", event = "page_pruned", page = page_index);
                continue;
            }
            let page = chunk.decode_page(page_index)?;
            group.set_page(page_index, builder.measure_mask(target, &page)?);
        }
        Ok(group)
    }
}

impl FilterExecutor for LessThanFilter {
    fn is_block_scan_required(&self, statistics: &BlockStatistics) -> Result<bool, FilterError> {
        let Some(chunk_index) = self.chunk_index else {
            return Ok(self.absent_default_matches);
        };
        if !self.options.use_min_max {
            return Ok(true);
        }
        let column = match self.target {
            ResolvedTarget::Dimension(_) => statistics.dimension(chunk_index),
            ResolvedTarget::Measure(_) => statistics.measure(chunk_index),
        };
        match column {
            Some(column) => MinMaxPruner::new(&self.target)
                .is_scan_required(column.min(), column.is_min_max_set()),
            None => Ok(true),
        }
    }

    fn prune_pages(&self, chunks: &BlockChunks) -> Result<BooleanBuffer, FilterError> {
        let Some(chunk_index) = self.chunk_index else {
            let pages = chunks.block().number_of_pages();
            return Ok(if self.absent_default_matches {
                BooleanBuffer::new_set(pages)
            } else {
                BooleanBuffer::new_unset(pages)
            });
        };
        match self.target {
            ResolvedTarget::Dimension(_) => {
                let chunk = chunks.dimension_chunk(chunk_index)?;
                self.keep_pages(chunk.pages_count(), chunk.statistics())
            }
            ResolvedTarget::Measure(_) => {
                let chunk = chunks.measure_chunk(chunk_index)?;
                self.keep_pages(chunk.pages_count(), chunk.statistics())
            }
        }
    }

    fn apply_filter(&self, chunks: &BlockChunks) -> Result<BitmaskGroup, FilterError> {
        let group = match (self.chunk_index, &self.target) {
            (None, _) => BitmaskGroup::with_default(
                chunks.block().number_of_pages(),
                chunks.block().num_rows(),
                self.options.rows_per_page,
                self.absent_default_matches,
            ),
            (Some(chunk_index), ResolvedTarget::Dimension(target)) => {
                self.apply_dimension(target, chunks, chunk_index)?
            }
            (Some(chunk_index), ResolvedTarget::Measure(target)) => {
                self.apply_measure(target, chunks, chunk_index)?
            }
        };
        log_debug!(
            component = "less_than",
            event = "block_filtered",
            kind = %self.kind(),
            absent = self.chunk_index.is_none(),
            pages = group.page_count(),
            selected_rows = group.selected_rows(),
        );
        Ok(group)
    }

    fn apply_row(&self, row: &dyn RowView, dim_ordinal_max: usize) -> bool {
        if self.chunk_index.is_none() {
            return self.absent_default_matches;
        }
        RowPredicateEvaluator::new(&self.target).evaluate(row, dim_ordinal_max)
    }

    fn read_column_chunks(&self, chunks: &BlockChunks) -> Result<(), FilterError> {
        let Some(chunk_index) = self.chunk_index else {
            return Ok(());
        };
        match self.kind() {
            ChunkKind::Dimension => {
                chunks.dimension_chunk(chunk_index)?;
            }
            ChunkKind::Measure => {
                chunks.measure_chunk(chunk_index)?;
            }
        }
        Ok(())
    }
}
