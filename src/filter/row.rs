use bytes::Bytes;

use crate::{filter::predicate::ResolvedTarget, value::MeasureValue};

/// One cell of a materialized row.
#[derive(Clone, Debug, PartialEq)]
pub enum RowCell {
    /// Encoded dimension value.
    Dimension(Bytes),
    /// Measure value, `None` for null.
    Measure(Option<MeasureValue>),
}

/// Positional access to the cells of a row: dimensions first, then measures.
pub trait RowView {
    /// Cell at a position, `None` past the end of the row.
    fn cell(&self, ordinal: usize) -> Option<&RowCell>;
}

/// Owned row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterializedRow {
    cells: Vec<RowCell>,
}

impl MaterializedRow {
    /// Row over cells in position order.
    #[must_use]
    pub fn new(cells: Vec<RowCell>) -> Self {
        Self { cells }
    }
}

impl FromIterator<RowCell> for MaterializedRow {
    fn from_iter<I: IntoIterator<Item = RowCell>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl RowView for MaterializedRow {
    fn cell(&self, ordinal: usize) -> Option<&RowCell> {
        self.cells.get(ordinal)
    }
}

/// Evaluates the predicate against a single row with the same semantics as the page path.
pub(crate) struct RowPredicateEvaluator<'a> {
    target: &'a ResolvedTarget,
}

impl<'a> RowPredicateEvaluator<'a> {
    pub(crate) fn new(target: &'a ResolvedTarget) -> Self {
        Self { target }
    }

    pub(crate) fn evaluate(&self, row: &dyn RowView, dim_ordinal_max: usize) -> bool {
        match self.target {
            ResolvedTarget::Dimension(target) => match row.cell(target.column.ordinal()) {
                Some(RowCell::Dimension(value)) => target.matches(value),
                _ => false,
            },
            ResolvedTarget::Measure(target) => {
                match row.cell(target.column.ordinal() + dim_ordinal_max) {
                    Some(RowCell::Measure(value)) => target.matches(value.as_ref()),
                    _ => false,
                }
            }
        }
    }
}
