#![deny(missing_docs)]
//! Range predicate evaluation for columnar block scans.
//!
//! [`LessThanFilter`] evaluates `column < bound` against one block at a time:
//! stored min statistics prune whole pages or blocks, surviving pages are
//! decoded once and turned into row masks, and single materialized rows can be
//! checked with the same semantics.
//!
//! Sorted dimension pages are carved with binary search, translating storage
//! positions back to rows through their inverted index when they have one.
//! Unsorted dimension pages and measure pages are compared row by row.

mod observability;
mod option;

/// Per-page row selections.
pub mod bitmask;
/// Raw chunk acquisition, statistics and the in-memory block.
pub mod chunk;
/// Byte and typed measure orderings.
pub mod compare;
/// Filter executors and the row view they evaluate.
pub mod filter;
/// Decoded dimension and measure pages.
pub mod page;
/// Column metadata and segment layout.
pub mod schema;
/// Typed scalars and value encodings.
pub mod value;

pub use crate::{
    bitmask::BitmaskGroup,
    filter::{FilterError, FilterExecutor, FilterTarget, LessThanFilter},
    option::{FilterOptions, DEFAULT_ROWS_PER_PAGE},
};
