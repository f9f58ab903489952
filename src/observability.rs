//! Logging infrastructure for the range filter.
//!
//! Events go through `tracing` with the single target "rangefilter" and always
//! carry `component` and `event` fields so callers can filter on them.
//!
//! ## Library Integration
//!
//! The crate never initializes a global subscriber. Applications configure
//! tracing via `tracing_subscriber` or similar.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - `component`: subsystem (e.g., "less_than", "chunk")
//! - Use `%` for Display, `?` for Debug formatting
//! - Per-page events are trace level; per-block summaries are debug level

/// Target for all range filter log events.
pub(crate) const RANGEFILTER_TARGET: &str = "rangefilter";

/// Macro for debug-level log events.
///
/// # Example
/// ```ignore
/// log_debug!(
///     component = "less_than",
///     event = "block_filtered",
///     pages = group.page_count(),
///     selected_rows = group.selected_rows(),
/// );
/// ```
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::RANGEFILTER_TARGET, $($field)*)
    };
}

/// Macro for trace-level log events.
macro_rules! log_trace {
    ($($field:tt)*) => {
        ::tracing::trace!(target: $crate::observability::RANGEFILTER_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::RANGEFILTER_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_trace;
pub(crate) use log_warn;
