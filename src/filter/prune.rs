use crate::{
    compare::compare_bytes,
    filter::{
        predicate::{DimensionTarget, MeasureTarget, ResolvedTarget},
        FilterError,
    },
    schema::DimensionKind,
    value::codec,
};

/// Decides from a stored min value whether a page or block may hold matches.
///
/// Only the min matters for `<`: if no bound exceeds the smallest value,
/// nothing in the range can be below a bound.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MinMaxPruner<'a> {
    target: &'a ResolvedTarget,
}

impl<'a> MinMaxPruner<'a> {
    pub(crate) fn new(target: &'a ResolvedTarget) -> Self {
        Self { target }
    }

    /// `false` only when the statistics prove that no row can match.
    pub(crate) fn is_scan_required(
        &self,
        min: Option<&[u8]>,
        min_max_set: bool,
    ) -> Result<bool, FilterError> {
        let Some(min) = min.filter(|_| min_max_set) else {
            return Ok(true);
        };
        match self.target {
            ResolvedTarget::Dimension(target) if target.kind == DimensionKind::Primitive => {
                primitive_scan_required(target, min)
            }
            ResolvedTarget::Dimension(target) => Ok(target
                .bounds
                .iter()
                .any(|bound| compare_bytes(bound, min).is_gt())),
            ResolvedTarget::Measure(target) => measure_scan_required(target, min),
        }
    }
}

fn primitive_scan_required(target: &DimensionTarget, min: &[u8]) -> Result<bool, FilterError> {
    let Some(comparator) = target.comparator else {
        return Ok(true);
    };
    if target.typed_bounds.iter().any(Option::is_none) {
        return Ok(true);
    }
    let Some(min) = codec::decode_primitive(min, target.column.data_type())? else {
        return Ok(true);
    };
    Ok(target
        .typed_bounds
        .iter()
        .flatten()
        .any(|bound| comparator.compare(bound, &min).is_gt()))
}

fn measure_scan_required(target: &MeasureTarget, min: &[u8]) -> Result<bool, FilterError> {
    if target.has_null_bound {
        return Ok(true);
    }
    let Some(min) = codec::decode_measure(min, target.data_type())? else {
        return Ok(true);
    };
    Ok(target
        .bounds
        .iter()
        .flatten()
        .any(|bound| target.comparator.compare(bound, &min).is_gt()))
}
