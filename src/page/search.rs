use crate::page::DimensionPage;

/// Outcome of a binary search over the storage positions of a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SearchResult {
    /// Position holding a value equal to the target.
    Found(usize),
    /// No equal value; the target would be inserted before this position.
    NotFound(usize),
}

/// Which occurrence to report when the target appears more than once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Bias {
    First,
    Last,
}

/// Binary search `target` among storage positions `[low, high)`.
///
/// The page must be non-decreasing over that range.
pub(crate) fn search(
    page: &DimensionPage,
    low: usize,
    high: usize,
    target: &[u8],
    bias: Bias,
) -> SearchResult {
    let first_not_less = partition_point(low, high, |position| page.value_at(position) < target);
    match bias {
        Bias::First => {
            if first_not_less < high && page.value_at(first_not_less) == target {
                SearchResult::Found(first_not_less)
            } else {
                SearchResult::NotFound(first_not_less)
            }
        }
        Bias::Last => {
            let first_greater = partition_point(first_not_less, high, |position| {
                page.value_at(position) <= target
            });
            if first_greater > first_not_less {
                SearchResult::Found(first_greater - 1)
            } else {
                SearchResult::NotFound(first_not_less)
            }
        }
    }
}

fn partition_point(mut low: usize, mut high: usize, pred: impl Fn(usize) -> bool) -> usize {
    while low < high {
        let mid = low + (high - low) / 2;
        if pred(mid) {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}
