/// Rows per page used when a block has to be described without reading it.
pub const DEFAULT_ROWS_PER_PAGE: usize = 32_000;

/// Tuning knobs for a range filter.
///
/// Options are built by value:
///
/// ```
/// use rangefilter::FilterOptions;
///
/// let options = FilterOptions::default().use_min_max(false).rows_per_page(1024);
/// assert_eq!(options.rows_per_page_value(), 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub(crate) use_min_max: bool,
    pub(crate) rows_per_page: usize,
    pub(crate) verify_sorted_pages: bool,
    pub(crate) use_local_dictionary: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            use_min_max: true,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            verify_sorted_pages: cfg!(debug_assertions),
            use_local_dictionary: true,
        }
    }
}

impl FilterOptions {
    /// Consult stored min statistics before decoding a page.
    pub fn use_min_max(self, use_min_max: bool) -> Self {
        FilterOptions {
            use_min_max,
            ..self
        }
    }

    /// Page size used to shape the bitmask group of a block whose column is absent.
    pub fn rows_per_page(self, rows_per_page: usize) -> Self {
        FilterOptions {
            rows_per_page: rows_per_page.max(1),
            ..self
        }
    }

    /// Check monotonicity of a page before binary-search carving it.
    pub fn verify_sorted_pages(self, verify_sorted_pages: bool) -> Self {
        FilterOptions {
            verify_sorted_pages,
            ..self
        }
    }

    /// Resolve pages carrying a local dictionary through the dictionary path.
    pub fn use_local_dictionary(self, use_local_dictionary: bool) -> Self {
        FilterOptions {
            use_local_dictionary,
            ..self
        }
    }

    /// Configured page size.
    pub fn rows_per_page_value(&self) -> usize {
        self.rows_per_page
    }
}
