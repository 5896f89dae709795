//! Background correction of the raw recording columns.
//!
//! Column A holds time, and the last `background_columns` columns hold the
//! background traces. Every column in between whose index is a multiple of
//! `skip_period` is an unwanted channel. Each remaining column is paired with
//! one background column and corrected row by row.

use crate::config::ColumnLayout;
use crate::error::{PipelineError, PipelineResult};
use crate::grid::SheetGrid;
use crate::table::ColumnTable;

/// Distance from the right edge of the background column that corrects
/// source column `j`, or `None` when `j` is skipped.
///
/// For the default layout, columns with `(j + 1) % 3 == 0` use the last
/// column and columns with `(j + 2) % 3 == 0` use the one before it.
///
/// # Errors
///
/// Returns `InvariantViolation` when the offset falls outside the trailing
/// background block.
pub fn background_offset(j: usize, layout: &ColumnLayout) -> PipelineResult<Option<usize>> {
    let phase = j % layout.skip_period;
    if phase == 0 {
        return Ok(None);
    }

    let offset = layout.skip_period - phase;
    if offset == 0 || offset > layout.background_columns {
        return Err(PipelineError::InvariantViolation {
            column: j,
            offset,
            background_columns: layout.background_columns,
        });
    }
    Ok(Some(offset))
}

/// Subtract the matching background column from every retained column.
///
/// `data_start` is the header row; data rows follow it to the end of the
/// sheet. Output column `n` takes its header verbatim from the header row.
///
/// # Errors
///
/// Returns `DataFormat` for a non-numeric data cell, `InvariantViolation` for
/// a layout that pairs a column outside the background block and
/// `OutOfRange` when more columns are retained than can be labelled.
pub fn correct_background(
    grid: &SheetGrid,
    data_start: usize,
    layout: &ColumnLayout,
) -> PipelineResult<ColumnTable> {
    let (rows, cols) = grid.dimensions();
    let mut corrected = ColumnTable::new();

    for j in 1..cols.saturating_sub(layout.background_columns) {
        let Some(offset) = background_offset(j, layout)? else {
            tracing::debug!("skipping unwanted column: {}", j);
            continue;
        };
        let background = cols - offset;

        let values = ((data_start + 1)..rows)
            .map(|k| {
                let primary = grid.number(k, j)?;
                let bg = grid.number(k, background)?;
                tracing::trace!(primary, bg, corrected = primary - bg, "background corrected");
                Ok(primary - bg)
            })
            .collect::<PipelineResult<Vec<f64>>>()?;

        let column = corrected.push(grid.cell(data_start, j), values)?;
        tracing::debug!(
            "wrote column {} ({:?}) from source column {} with background column {}",
            column.label,
            column.header,
            j,
            background
        );
    }

    Ok(corrected)
}
