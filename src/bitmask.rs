//! Per-page row selections produced by a filter.

use arrow::{array::BooleanBufferBuilder, buffer::BooleanBuffer};

/// Mutable row mask of one page, sized once and never grown.
pub(crate) struct RowMask {
    bits: BooleanBufferBuilder,
    rows: usize,
}

impl RowMask {
    pub(crate) fn new(rows: usize) -> Self {
        let mut bits = BooleanBufferBuilder::new(rows);
        bits.append_n(rows, false);
        Self { bits, rows }
    }

    #[inline]
    pub(crate) fn set(&mut self, row: usize) {
        self.bits.set_bit(row, true);
    }

    #[inline]
    pub(crate) fn clear(&mut self, row: usize) {
        self.bits.set_bit(row, false);
    }

    #[inline]
    pub(crate) fn get(&self, row: usize) -> bool {
        self.bits.get_bit(row)
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn finish(mut self) -> BooleanBuffer {
        self.bits.finish()
    }
}

/// Row masks of every page of a block.
///
/// `None` marks a page that was pruned without being decoded; its rows are
/// all unselected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitmaskGroup {
    pages: Vec<Option<BooleanBuffer>>,
}

impl BitmaskGroup {
    /// Group of `pages` pruned pages.
    #[must_use]
    pub fn new(pages: usize) -> Self {
        Self {
            pages: vec![None; pages],
        }
    }

    /// Group of `pages` pages covering `num_rows` rows, every row set to
    /// `selected`. Pages hold `rows_per_page` rows and the last page takes the
    /// remainder.
    #[must_use]
    pub fn with_default(
        pages: usize,
        num_rows: usize,
        rows_per_page: usize,
        selected: bool,
    ) -> Self {
        let mut remaining = num_rows;
        let pages = (0..pages)
            .map(|page| {
                let rows = if page + 1 == pages {
                    remaining
                } else {
                    rows_per_page.min(remaining)
                };
                remaining -= rows;
                let mut bits = BooleanBufferBuilder::new(rows);
                bits.append_n(rows, selected);
                Some(bits.finish())
            })
            .collect();
        Self { pages }
    }

    /// Store the mask of a page.
    pub fn set_page(&mut self, page: usize, mask: BooleanBuffer) {
        if page >= self.pages.len() {
            self.pages.resize(page + 1, None);
        }
        self.pages[page] = Some(mask);
    }

    /// Mask of a page, `None` when the page was pruned.
    #[must_use]
    pub fn page(&self, page: usize) -> Option<&BooleanBuffer> {
        self.pages.get(page).and_then(Option::as_ref)
    }

    /// Number of pages in the group.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Selected rows of a page, in row order.
    #[must_use]
    pub fn selected(&self, page: usize) -> Vec<usize> {
        self.page(page)
            .map(|mask| mask.set_indices().collect())
            .unwrap_or_default()
    }

    /// Selected rows across all pages.
    #[must_use]
    pub fn selected_rows(&self) -> usize {
        self.pages
            .iter()
            .flatten()
            .map(BooleanBuffer::count_set_bits)
            .sum()
    }

    /// Iterate over page masks in page order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&BooleanBuffer>> {
        self.pages.iter().map(Option::as_ref)
    }
}
