//! Peak extraction and peak-ordered sorting of ratio columns.

use crate::config::PeakWindow;
use crate::error::{PipelineError, PipelineResult};
use crate::table::{Column, ColumnTable};
use serde::Serialize;
use std::ops::Range;

/// Whether peak `a` ranks strictly above peak `b`. NaN ranks below every
/// number.
fn outranks(a: f64, b: f64) -> bool {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a > b,
        (false, true) => true,
        (true, _) => false,
    }
}

/// Peak per ratio column, drained in descending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakTable {
    peaks: Vec<Option<f64>>,
}

impl PeakTable {
    #[must_use]
    pub fn new(peaks: Vec<f64>) -> Self {
        Self {
            peaks: peaks.into_iter().map(Some).collect(),
        }
    }

    /// Peak of a column that has not been taken yet.
    #[must_use]
    pub fn peak(&self, column: usize) -> Option<f64> {
        self.peaks.get(column).copied().flatten()
    }

    /// Number of columns not yet taken.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.peaks.iter().filter(|p| p.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Remove and return the column with the greatest peak. Ties go to the
    /// lowest column index.
    pub fn take_max(&mut self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, peak) in self.peaks.iter().enumerate() {
            let Some(peak) = *peak else { continue };
            match best {
                Some((_, top)) if !outranks(peak, top) => {}
                _ => best = Some((index, peak)),
            }
        }

        if let Some((index, _)) = best {
            self.peaks[index] = None;
        }
        best
    }
}

/// Data-row indices covered by `window` in a table of `rows` sheet rows.
///
/// The header row is never part of the window and `stop` is clamped to the
/// table.
///
/// # Errors
///
/// Returns `EmptyWindow` when no data row remains.
pub fn window_rows(window: PeakWindow, rows: usize) -> PipelineResult<Range<usize>> {
    let start = window.start.max(1);
    let stop = window.stop.min(rows);
    if start >= stop {
        return Err(PipelineError::EmptyWindow {
            start: window.start,
            stop,
            rows,
        });
    }
    Ok((start - 1)..(stop - 1))
}

/// Maximum of `values`, starting from the first value. NaN values are
/// ignored unless every value is NaN.
#[must_use]
pub fn column_peak(values: &[f64]) -> Option<f64> {
    values.iter().copied().fold(None, |peak, value| match peak {
        Some(top) if !outranks(value, top) => Some(top),
        _ => Some(value),
    })
}

/// Peak of every ratio column within `window`.
///
/// # Errors
///
/// Returns `EmptyWindow` when the window holds no data rows.
pub fn extract_peaks(ratios: &ColumnTable, window: PeakWindow) -> PipelineResult<PeakTable> {
    let rows = window_rows(window, ratios.row_count())?;

    let peaks = ratios
        .columns()
        .iter()
        .map(|column| {
            let end = rows.end.min(column.values.len());
            let start = rows.start.min(end);
            column_peak(&column.values[start..end]).ok_or(PipelineError::EmptyWindow {
                start: window.start,
                stop: window.stop,
                rows: column.values.len() + 1,
            })
        })
        .collect::<PipelineResult<Vec<f64>>>()?;

    Ok(PeakTable::new(peaks))
}

/// A ratio column's place in the sorted output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedColumn {
    /// 0-based index in the ratio table
    pub source_index: usize,
    pub header: String,
    pub peak: f64,
}

/// Ratio columns in descending peak order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedMatrix {
    pub table: ColumnTable,
    pub order: Vec<RankedColumn>,
}

impl SortedMatrix {
    /// Original ratio-column index of every output column, in output order.
    #[must_use]
    pub fn permutation(&self) -> Vec<usize> {
        self.order.iter().map(|r| r.source_index).collect()
    }
}

/// Reorder ratio columns by descending peak within `window`.
///
/// Each column is copied whole (header and every row) to the next free
/// output column. An empty ratio table sorts to an empty table.
///
/// # Errors
///
/// Returns `EmptyWindow` when the window holds no data rows.
pub fn sort_by_peak(ratios: &ColumnTable, window: PeakWindow) -> PipelineResult<SortedMatrix> {
    let mut sorted = SortedMatrix::default();
    if ratios.is_empty() {
        return Ok(sorted);
    }

    let mut peaks = extract_peaks(ratios, window)?;
    tracing::debug!("peaks: {:?}", peaks);

    while let Some((index, peak)) = peaks.take_max() {
        let Column { header, values, .. } = ratios.column(index)?;
        let column = sorted.table.push(header.clone(), values.clone())?;
        tracing::debug!(
            "moved ratio column {} (peak {}) to column {}",
            index + 1,
            peak,
            column.label
        );
        sorted.order.push(RankedColumn {
            source_index: index,
            header: header.clone(),
            peak,
        });
    }

    Ok(sorted)
}
