//! Optional response-threshold filter.
//!
//! Off unless a positive threshold is configured. When on, it keeps only
//! the ratio columns that respond: at least one data value strictly above
//! the threshold. Its output goes to a separate workbook and never changes
//! the corrected, ratio or sorted results.

use crate::error::PipelineResult;
use crate::table::ColumnTable;

/// Whether any value of a column is strictly above `threshold`.
#[must_use]
pub fn responds(values: &[f64], threshold: f64) -> bool {
    values.iter().any(|v| *v > threshold)
}

/// Copy the responding columns of `table`, in order, under fresh labels.
///
/// # Errors
///
/// Returns `OutOfRange` when the kept columns cannot be labelled.
pub fn apply_threshold(table: &ColumnTable, threshold: f64) -> PipelineResult<ColumnTable> {
    let mut kept = ColumnTable::new();
    for column in table.columns() {
        if responds(&column.values, threshold) {
            kept.push(column.header.clone(), column.values.clone())?;
        } else {
            tracing::debug!(
                "dropping column {} ({}): no value above {}",
                column.label,
                column.header,
                threshold
            );
        }
    }
    Ok(kept)
}
