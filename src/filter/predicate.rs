use arrow::datatypes::DataType;
use bytes::Bytes;

use crate::{
    compare::{compare_bytes, MeasureComparator},
    filter::FilterError,
    schema::{DimensionColumn, DimensionKind, MeasureColumn},
    value::{
        codec::{self, MEMBER_DEFAULT},
        MeasureValue,
    },
};

/// Column and bounds of a range predicate.
///
/// A row matches when its value is below at least one bound.
#[derive(Clone, Debug)]
pub enum FilterTarget {
    /// Predicate over an encoded dimension column.
    Dimension {
        /// Filtered column.
        column: DimensionColumn,
        /// Bounds in the column's encoding.
        bounds: Vec<Bytes>,
    },
    /// Predicate over a measure column.
    Measure {
        /// Filtered column.
        column: MeasureColumn,
        /// Bounds; `None` selects null rows.
        bounds: Vec<Option<MeasureValue>>,
    },
}

/// Predicate state derived once from a [`FilterTarget`].
#[derive(Debug)]
pub(crate) enum ResolvedTarget {
    Dimension(DimensionTarget),
    Measure(MeasureTarget),
}

impl ResolvedTarget {
    pub(crate) fn try_new(target: FilterTarget) -> Result<Self, FilterError> {
        match target {
            FilterTarget::Dimension { column, bounds } => {
                DimensionTarget::try_new(column, bounds).map(ResolvedTarget::Dimension)
            }
            FilterTarget::Measure { column, bounds } => {
                MeasureTarget::try_new(column, bounds).map(ResolvedTarget::Measure)
            }
        }
    }

    /// Whether the column's declared default satisfies the predicate.
    pub(crate) fn default_matches(&self) -> Result<bool, FilterError> {
        match self {
            ResolvedTarget::Dimension(target) => Ok(target.default_matches()),
            ResolvedTarget::Measure(target) => target.default_matches(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct DimensionTarget {
    pub(crate) column: DimensionColumn,
    pub(crate) kind: DimensionKind,
    pub(crate) bounds: Vec<Bytes>,
    /// Largest bound; carving against it covers every other bound.
    pub(crate) widest: Option<Bytes>,
    /// Primitive bounds decoded to typed values, `None` for empty bounds.
    pub(crate) typed_bounds: Vec<Option<MeasureValue>>,
    pub(crate) comparator: Option<MeasureComparator>,
    /// Value whose run is skipped at the front of a sorted page.
    pub(crate) carve_default: Option<Bytes>,
    /// Value the null post-pass clears.
    pub(crate) null_value: Bytes,
}

impl DimensionTarget {
    fn try_new(column: DimensionColumn, bounds: Vec<Bytes>) -> Result<Self, FilterError> {
        let kind = DimensionKind::of(column.data_type()).ok_or_else(|| {
            FilterError::UnsupportedType {
                column: column.name().to_owned(),
                data_type: column.data_type().clone(),
            }
        })?;
        let (typed_bounds, comparator) = match kind {
            DimensionKind::Primitive => {
                let typed = bounds
                    .iter()
                    .map(|bound| codec::decode_primitive(bound, column.data_type()))
                    .collect::<Result<Vec<_>, _>>()?;
                (typed, MeasureComparator::for_type(column.data_type()))
            }
            DimensionKind::Date => {
                if let Some(bound) = bounds.iter().find(|bound| bound.len() != 4) {
                    return Err(FilterError::BoundTypeMismatch {
                        column: column.name().to_owned(),
                        bound: format!("{bound:?}"),
                    });
                }
                (Vec::new(), None)
            }
            DimensionKind::String => (Vec::new(), None),
        };
        let (carve_default, null_value) = match kind {
            DimensionKind::Date => (Some(codec::date_null_value()), codec::date_null_value()),
            DimensionKind::Primitive => (Some(Bytes::new()), Bytes::new()),
            DimensionKind::String => (None, Bytes::from_static(MEMBER_DEFAULT)),
        };
        let widest = bounds.iter().max().cloned();
        Ok(Self {
            column,
            kind,
            bounds,
            widest,
            typed_bounds,
            comparator,
            carve_default,
            null_value,
        })
    }

    #[inline]
    pub(crate) fn is_null(&self, value: &[u8]) -> bool {
        value == self.null_value.as_ref()
    }

    /// True when some bound is greater than `value`.
    #[inline]
    pub(crate) fn below_bound(&self, value: &[u8]) -> bool {
        self.widest
            .as_ref()
            .is_some_and(|widest| compare_bytes(value, widest).is_lt())
    }

    /// Non-null and below some bound.
    #[inline]
    pub(crate) fn matches(&self, value: &[u8]) -> bool {
        !self.is_null(value) && self.below_bound(value)
    }

    fn default_matches(&self) -> bool {
        self.column
            .default_value()
            .is_some_and(|default| self.matches(default))
    }
}

#[derive(Debug)]
pub(crate) struct MeasureTarget {
    pub(crate) column: MeasureColumn,
    /// Bounds coerced into the comparator's family.
    pub(crate) bounds: Vec<Option<MeasureValue>>,
    pub(crate) comparator: MeasureComparator,
    pub(crate) has_null_bound: bool,
}

impl MeasureTarget {
    fn try_new(
        column: MeasureColumn,
        bounds: Vec<Option<MeasureValue>>,
    ) -> Result<Self, FilterError> {
        let comparator = MeasureComparator::for_type(column.data_type()).ok_or_else(|| {
            FilterError::UnsupportedType {
                column: column.name().to_owned(),
                data_type: column.data_type().clone(),
            }
        })?;
        let bounds = bounds
            .into_iter()
            .map(|bound| match bound {
                None => Ok(None),
                Some(value) => comparator.coerce(value).map(Some).ok_or_else(|| {
                    FilterError::BoundTypeMismatch {
                        column: column.name().to_owned(),
                        bound: format!("{value:?}"),
                    }
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let has_null_bound = bounds.iter().any(Option::is_none);
        Ok(Self {
            column,
            bounds,
            comparator,
            has_null_bound,
        })
    }

    /// True when `value` is below some non-null bound.
    #[inline]
    pub(crate) fn below_bound(&self, value: &MeasureValue) -> bool {
        self.bounds
            .iter()
            .flatten()
            .any(|bound| self.comparator.compare(value, bound).is_lt())
    }

    /// Null values match only a null bound.
    pub(crate) fn matches(&self, value: Option<&MeasureValue>) -> bool {
        match value {
            None => self.has_null_bound,
            Some(value) => self.below_bound(value),
        }
    }

    pub(crate) fn data_type(&self) -> &DataType {
        self.column.data_type()
    }

    fn default_matches(&self) -> Result<bool, FilterError> {
        let default = match self.column.default_value() {
            Some(bytes) => codec::decode_measure(bytes, self.data_type())?,
            None => None,
        };
        Ok(self.matches(default.as_ref()))
    }
}
