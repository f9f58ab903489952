//! Per-page row masks for `value < bound`.
//!
//! Sorted dimension pages are carved with two binary searches: one past the
//! leading run of default (null) values, one for the first value not below the
//! widest bound. Everything else is compared row by row. Null rows are cleared
//! from every dimension mask afterwards.

use arrow::buffer::BooleanBuffer;

use crate::{
    bitmask::RowMask,
    filter::{
        predicate::{DimensionTarget, MeasureTarget},
        FilterError,
    },
    page::{
        search, Bias, ColumnPage, DimensionPage, MeasurePage, MeasureValues, RowLookup,
        SearchResult,
    },
};

/// How a dimension page is scanned, decided once per page.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ScanStrategy<'a> {
    Carve(RowLookup<'a>),
    Linear,
}

impl<'a> ScanStrategy<'a> {
    pub(crate) fn resolve(page: &'a DimensionPage, sort_column: bool) -> Self {
        match page.inverted_index() {
            Some(index) => ScanStrategy::Carve(RowLookup::Inverted(index)),
            None if sort_column && page.is_sorted() => ScanStrategy::Carve(RowLookup::Identity),
            None => ScanStrategy::Linear,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RangeBitsetBuilder {
    verify_sorted: bool,
}

impl RangeBitsetBuilder {
    pub(crate) fn new(verify_sorted: bool) -> Self {
        Self { verify_sorted }
    }

    pub(crate) fn dimension_mask(
        &self,
        target: &DimensionTarget,
        page: &DimensionPage,
        page_index: usize,
    ) -> Result<BooleanBuffer, FilterError> {
        let rows = page.row_count();
        let mut mask = RowMask::new(rows);
        match ScanStrategy::resolve(page, target.column.is_sort_column()) {
            ScanStrategy::Carve(lookup) => {
                if self.verify_sorted {
                    if let Some(position) = page.first_unsorted_position() {
                        return Err(FilterError::UnsortedPage {
                            page: page_index,
                            position,
                        });
                    }
                }
                carve(target, page, lookup, &mut mask);
            }
            ScanStrategy::Linear => {
                for row in 0..rows {
                    if target.below_bound(page.row_value(row)) {
                        mask.set(row);
                    }
                }
            }
        }
        clear_nulls(target, page, &mut mask);
        Ok(mask.finish())
    }

    pub(crate) fn measure_mask(
        &self,
        target: &MeasureTarget,
        page: &MeasurePage,
    ) -> Result<BooleanBuffer, FilterError> {
        let values = MeasureValues::try_new(page)?;
        let rows = page.row_count();
        let mut mask = RowMask::new(rows);
        for row in 0..rows {
            let selected = if page.is_null(row) {
                target.has_null_bound
            } else {
                target.below_bound(&values.value(row))
            };
            if selected {
                mask.set(row);
            }
        }
        Ok(mask.finish())
    }
}

fn carve(
    target: &DimensionTarget,
    page: &DimensionPage,
    lookup: RowLookup<'_>,
    mask: &mut RowMask,
) {
    let rows = mask.rows();
    let Some(widest) = target.widest.as_deref() else {
        return;
    };
    if rows == 0 {
        return;
    }
    let skip = match target.carve_default.as_deref() {
        Some(default) if !page.is_adaptive() => {
            match search(page, 0, rows, default, Bias::Last) {
                SearchResult::Found(last_default) => last_default + 1,
                SearchResult::NotFound(insertion) => insertion,
            }
        }
        _ => 0,
    };
    if skip == rows {
        return;
    }
    let end = match search(page, skip, rows, widest, Bias::First) {
        SearchResult::Found(first_equal) => first_equal,
        SearchResult::NotFound(insertion) => {
            let last = insertion.min(rows - 1);
            if page.value_at(last) < widest {
                last + 1
            } else {
                last
            }
        }
    };
    for position in skip..end {
        mask.set(lookup.row(position));
    }
}

fn clear_nulls(target: &DimensionTarget, page: &DimensionPage, mask: &mut RowMask) {
    for row in 0..mask.rows() {
        if mask.get(row) && target.is_null(page.row_value(row)) {
            mask.clear(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Float64Array, Int64Array},
        datatypes::DataType,
    };
    use bytes::Bytes;

    use super::*;
    use crate::{
        filter::{predicate::ResolvedTarget, FilterTarget},
        schema::{DimensionColumn, MeasureColumn},
        value::{codec, MeasureValue},
    };

    fn dimension(column: DimensionColumn, bounds: Vec<Bytes>) -> DimensionTarget {
        match ResolvedTarget::try_new(FilterTarget::Dimension { column, bounds }).expect("target") {
            ResolvedTarget::Dimension(target) => target,
            ResolvedTarget::Measure(_) => unreachable!(),
        }
    }

    fn measure(column: MeasureColumn, bounds: Vec<Option<MeasureValue>>) -> MeasureTarget {
        match ResolvedTarget::try_new(FilterTarget::Measure { column, bounds }).expect("target") {
            ResolvedTarget::Measure(target) => target,
            ResolvedTarget::Dimension(_) => unreachable!(),
        }
    }

    fn selected(mask: &BooleanBuffer) -> Vec<usize> {
        mask.set_indices().collect()
    }

    fn int(v: i64) -> Bytes {
        codec::encode_primitive(&MeasureValue::Int64(v), &DataType::Int64).expect("encode")
    }

    #[test]
    fn strategy_follows_page_shape() {
        let inverted = DimensionPage::sorted_with_inverted_index(&[b"b", b"a"]).expect("index");
        assert!(matches!(
            ScanStrategy::resolve(&inverted, false),
            ScanStrategy::Carve(RowLookup::Inverted(_))
        ));
        let sorted = DimensionPage::from_values([b"a", b"b"]).with_sorted(true);
        assert!(matches!(
            ScanStrategy::resolve(&sorted, true),
            ScanStrategy::Carve(RowLookup::Identity)
        ));
        assert!(matches!(ScanStrategy::resolve(&sorted, false), ScanStrategy::Linear));
    }

    #[test]
    fn carve_skips_leading_nulls_and_stops_before_bound() {
        let column = DimensionColumn::new("id", 0, DataType::Int64).with_sort_column(true);
        let target = dimension(column, vec![int(20)]);
        let page = DimensionPage::from_values([
            Bytes::new(),
            Bytes::new(),
            int(10),
            int(20),
            int(20),
            int(30),
        ])
        .with_sorted(true);
        let mask = RangeBitsetBuilder::new(true)
            .dimension_mask(&target, &page, 0)
            .expect("mask");
        assert_eq!(selected(&mask), vec![2]);
    }

    #[test]
    fn carve_without_nulls_starts_at_first_row() {
        let column = DimensionColumn::new("id", 0, DataType::Int64).with_sort_column(true);
        let target = dimension(column, vec![int(20)]);
        let page = DimensionPage::from_values([int(1), int(2), int(30)]).with_sorted(true);
        let mask = RangeBitsetBuilder::new(true)
            .dimension_mask(&target, &page, 0)
            .expect("mask");
        assert_eq!(selected(&mask), vec![0, 1]);
    }

    #[test]
    fn carve_covers_whole_page_below_bound() {
        let column = DimensionColumn::new("city", 0, DataType::Utf8);
        let target = dimension(column, vec![Bytes::from_static(b"zz")]);
        let page = DimensionPage::sorted_with_inverted_index(&[b"c", b"a", b"b"]).expect("index");
        let mask = RangeBitsetBuilder::new(true)
            .dimension_mask(&target, &page, 0)
            .expect("mask");
        assert_eq!(selected(&mask), vec![0, 1, 2]);
    }

    #[test]
    fn all_null_sorted_page_is_empty() {
        let column = DimensionColumn::new("day", 0, DataType::Date32).with_sort_column(true);
        let bound = codec::encode_date(100).expect("encode");
        let target = dimension(column, vec![bound]);
        let page = DimensionPage::from_values([codec::date_null_value(), codec::date_null_value()])
            .with_sorted(true)
            .with_no_dictionary(false);
        let mask = RangeBitsetBuilder::new(true)
            .dimension_mask(&target, &page, 0)
            .expect("mask");
        assert!(selected(&mask).is_empty());
    }

    #[test]
    fn string_nulls_are_cleared() {
        let column = DimensionColumn::new("city", 0, DataType::Utf8);
        let target = dimension(column, vec![Bytes::from_static(b"z")]);
        let page = DimensionPage::from_values([&b"b"[..], codec::MEMBER_DEFAULT, b"a"]);
        let mask = RangeBitsetBuilder::new(true)
            .dimension_mask(&target, &page, 0)
            .expect("mask");
        assert_eq!(selected(&mask), vec![0, 2]);
    }

    #[test]
    fn dictionary_pages_drop_nulls_on_every_path() {
        let column = DimensionColumn::new("id", 0, DataType::Int64).with_sort_column(true);
        let target = dimension(column, vec![int(10)]);
        let values = [Bytes::new(), int(5)];
        let carved = DimensionPage::from_values(&values)
            .with_sorted(true)
            .with_no_dictionary(false);
        let scanned = DimensionPage::from_values(&values).with_no_dictionary(false);
        let builder = RangeBitsetBuilder::new(true);
        let carved = builder.dimension_mask(&target, &carved, 0).expect("mask");
        let scanned = builder.dimension_mask(&target, &scanned, 0).expect("mask");
        assert_eq!(selected(&carved), vec![1]);
        assert_eq!(selected(&scanned), vec![1]);

        let column = DimensionColumn::new("city", 0, DataType::Utf8);
        let target = dimension(column, vec![Bytes::from_static(b"z")]);
        let page =
            DimensionPage::from_values([codec::MEMBER_DEFAULT, b"a"]).with_no_dictionary(false);
        let mask = builder.dimension_mask(&target, &page, 0).expect("mask");
        assert_eq!(selected(&mask), vec![1]);
    }

    #[test]
    fn unsorted_page_marked_sorted_is_rejected() {
        let column = DimensionColumn::new("city", 0, DataType::Utf8).with_sort_column(true);
        let target = dimension(column, vec![Bytes::from_static(b"c")]);
        let page = DimensionPage::from_values([b"b", b"a"]).with_sorted(true);
        let err = RangeBitsetBuilder::new(true)
            .dimension_mask(&target, &page, 4)
            .unwrap_err();
        assert!(matches!(err, FilterError::UnsortedPage { page: 4, position: 1 }));
    }

    #[test]
    fn measure_null_bound_selects_null_rows() {
        let column = MeasureColumn::new("qty", 0, DataType::Int64);
        let page = MeasurePage::new(Arc::new(Int64Array::from(vec![Some(5), None, Some(15)])));

        let target = measure(column.clone(), vec![Some(MeasureValue::Int64(10))]);
        let mask = RangeBitsetBuilder::new(false)
            .measure_mask(&target, &page)
            .expect("mask");
        assert_eq!(selected(&mask), vec![0]);

        let target = measure(column, vec![Some(MeasureValue::Int64(10)), None]);
        let mask = RangeBitsetBuilder::new(false)
            .measure_mask(&target, &page)
            .expect("mask");
        assert_eq!(selected(&mask), vec![0, 1]);
    }

    #[test]
    fn float_measures_compare_numerically() {
        let column = MeasureColumn::new("ratio", 0, DataType::Float64);
        let target = measure(column, vec![Some(MeasureValue::Int64(1))]);
        let page = MeasurePage::new(Arc::new(Float64Array::from(vec![0.5, 1.0, -3.0, 2.0])));
        let mask = RangeBitsetBuilder::new(false)
            .measure_mask(&target, &page)
            .expect("mask");
        assert_eq!(selected(&mask), vec![0, 2]);
    }
}
