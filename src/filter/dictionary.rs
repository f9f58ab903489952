use arrow::buffer::BooleanBuffer;

use crate::{
    bitmask::RowMask,
    chunk::LocalDictionary,
    filter::predicate::DimensionTarget,
    page::{ColumnPage, DimensionPage},
};

/// Predicate resolved against every entry of a local dictionary.
///
/// Keeps whichever key list is shorter: matching keys or rejected keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DictionaryFilter {
    Include { keys: Vec<u32>, entries: usize },
    Exclude { keys: Vec<u32>, entries: usize },
}

impl DictionaryFilter {
    pub(crate) fn build(dictionary: &LocalDictionary, target: &DimensionTarget) -> Self {
        let entries = dictionary.len();
        let (matching, rejected): (Vec<u32>, Vec<u32>) = (0..entries)
            .filter_map(|key| u32::try_from(key).ok())
            .partition(|key| {
                dictionary
                    .entry(*key)
                    .is_some_and(|entry| target.matches(entry))
            });
        if matching.len() <= rejected.len() {
            DictionaryFilter::Include {
                keys: matching,
                entries,
            }
        } else {
            DictionaryFilter::Exclude {
                keys: rejected,
                entries,
            }
        }
    }

    /// Keys outside the dictionary never match.
    pub(crate) fn accepts(&self, key: u32) -> bool {
        match self {
            DictionaryFilter::Include { keys, .. } => keys.binary_search(&key).is_ok(),
            DictionaryFilter::Exclude { keys, entries } => {
                (key as usize) < *entries && keys.binary_search(&key).is_err()
            }
        }
    }

    pub(crate) fn filter_page(&self, page: &DimensionPage) -> BooleanBuffer {
        let mut mask = RowMask::new(page.row_count());
        for row in 0..mask.rows() {
            if page.local_key(row).is_some_and(|key| self.accepts(key)) {
                mask.set(row);
            }
        }
        mask.finish()
    }
}
