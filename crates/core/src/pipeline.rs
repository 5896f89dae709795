//! Per-sheet pipeline and the workbook batch driver.
//!
//! Each sheet runs corrected → ratio → sorted (→ threshold) on its own data
//! only. The batch driver adds one sheet per stage to the output books in
//! source sheet order and collects a report at the end of every sheet.

use crate::background::correct_background;
use crate::config::{ChartLayout, PeakWindow, PipelineConfig, SheetErrorPolicy};
use crate::error::{PipelineError, PipelineResult};
use crate::grid::{MatrixSource, SheetGrid};
use crate::peak::{sort_by_peak, RankedColumn, SortedMatrix};
use crate::ratio::{compute_ratios, RatioMatrix};
use crate::table::ColumnTable;
use crate::threshold::apply_threshold;
use ratiobook_sheet::{Book, LineChart};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a batch and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// # Errors
    ///
    /// Returns `Cancelled` once `cancel` has been called.
    pub fn check(&self) -> PipelineResult<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Summary of one processed sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    /// Header row of the data block (0 when the marker was not found)
    pub data_start: usize,
    pub marker_found: bool,
    pub corrected_columns: usize,
    pub ratio_columns: usize,
    pub non_finite_ratios: usize,
    pub thresholded_columns: Option<usize>,
    /// Ratio columns in output order with their peaks
    pub order: Vec<RankedColumn>,
}

impl SheetReport {
    /// `ordered values for <sheet>: cell 2: 1.8 cell 1: 1.1 ...`
    #[must_use]
    pub fn order_line(&self) -> String {
        let mut line = format!("ordered values for {}:", self.name);
        for ranked in &self.order {
            let _ = write!(line, " {}: {}", ranked.header, ranked.peak);
        }
        line
    }
}

/// A sheet left out of the outputs under [`SheetErrorPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSheet {
    pub name: String,
    pub error: String,
}

/// Summary of a workbook run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub sheets: Vec<SheetReport>,
    pub skipped: Vec<SkippedSheet>,
    pub window: PeakWindow,
    pub trim_limit: usize,
    pub threshold: Option<f64>,
    pub charts: bool,
}

impl BatchReport {
    #[must_use]
    pub fn processed(&self) -> usize {
        self.sheets.len()
    }
}

/// Every derived matrix of one sheet.
#[derive(Debug, Clone)]
pub struct SheetOutput {
    pub name: String,
    pub corrected: ColumnTable,
    pub ratios: RatioMatrix,
    pub sorted: SortedMatrix,
    pub thresholded: Option<ColumnTable>,
    pub report: SheetReport,
}

/// The output workbooks, filled sheet by sheet in source order.
#[derive(Debug, Clone)]
pub struct OutputBooks {
    pub transformed: Book,
    pub ratios: Book,
    pub sorted: Book,
    /// Present only when the threshold filter is on
    pub threshold: Option<Book>,
}

impl OutputBooks {
    #[must_use]
    pub fn new(with_threshold: bool) -> Self {
        Self {
            transformed: Book::with_name("transformed_data"),
            ratios: Book::with_name("ratios"),
            sorted: Book::with_name("sorted_ratios"),
            threshold: with_threshold.then(|| Book::with_name("data_with_threshold")),
        }
    }

    /// Add one sheet per stage under the source sheet name.
    ///
    /// # Errors
    ///
    /// Propagates sheet construction failures, including duplicate names.
    pub fn add(&mut self, output: &SheetOutput, config: &PipelineConfig) -> PipelineResult<()> {
        let name = output.name.as_str();
        self.transformed
            .add_sheet(name, output.corrected.to_sheet(name)?)?;

        let mut ratio_sheet = output.ratios.table.to_sheet(name)?;
        if config.add_chart {
            for chart in ratio_charts(&output.ratios.table, &config.charts) {
                tracing::debug!("added chart {:?} to sheet {}", chart.anchor, name);
                ratio_sheet.add_line_chart(chart);
            }
        }
        self.ratios.add_sheet(name, ratio_sheet)?;

        self.sorted
            .add_sheet(name, output.sorted.table.to_sheet(name)?)?;

        if let (Some(book), Some(table)) = (self.threshold.as_mut(), output.thresholded.as_ref()) {
            book.add_sheet(name, table.to_sheet(name)?)?;
        }
        Ok(())
    }
}

/// Result of a whole workbook run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub books: OutputBooks,
    pub report: BatchReport,
}

/// Line charts for a ratio sheet. Series for missing columns are left out
/// and charts without series are dropped.
#[must_use]
pub fn ratio_charts(ratios: &ColumnTable, layout: &ChartLayout) -> Vec<LineChart> {
    if layout.last_row < 2 {
        return Vec::new();
    }

    layout
        .groups
        .iter()
        .filter_map(|group| {
            let end = (group.first_column + group.columns).min(ratios.col_count());
            if group.first_column >= end {
                return None;
            }
            let chart = (group.first_column..end).fold(
                LineChart::new(&layout.title, &group.anchor).with_size(layout.width, layout.height),
                |chart, col| chart.with_series(col, 1, layout.last_row - 1),
            );
            Some(chart)
        })
        .collect()
}

/// Run the pipeline on one sheet grid, locating the data block by the
/// configured marker label.
///
/// # Errors
///
/// Any fatal pipeline error, tagged with the sheet name.
pub fn process_sheet(name: &str, grid: &SheetGrid, config: &PipelineConfig) -> PipelineResult<SheetOutput> {
    let marker_row = grid.first_row_matching(&config.marker_label);
    transform_sheet(name, grid, marker_row, config, &CancelToken::new())
}

fn transform_sheet(
    name: &str,
    grid: &SheetGrid,
    marker_row: Option<usize>,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> PipelineResult<SheetOutput> {
    run_stages(name, grid, marker_row, config, cancel).map_err(|e| e.in_sheet(name))
}

fn run_stages(
    name: &str,
    grid: &SheetGrid,
    marker_row: Option<usize>,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> PipelineResult<SheetOutput> {
    let data_start = match marker_row {
        Some(row) => {
            tracing::info!("found ID: {} --> will start here", row);
            row
        }
        None => {
            let missing = PipelineError::MissingMarkerRow {
                label: config.marker_label.clone(),
            };
            tracing::warn!("{} in sheet {}; attempting to analyze data anyways", missing, name);
            0
        }
    };

    let corrected = correct_background(grid, data_start, &config.layout)?;
    cancel.check()?;

    let ratios = compute_ratios(&corrected, config.trim_limit)?;
    cancel.check()?;

    let sorted = sort_by_peak(&ratios.table, config.window)?;
    let thresholded = config
        .active_threshold()
        .map(|threshold| apply_threshold(&sorted.table, threshold))
        .transpose()?;

    let (rows, cols) = grid.dimensions();
    let report = SheetReport {
        name: name.to_string(),
        rows,
        cols,
        data_start,
        marker_found: marker_row.is_some(),
        corrected_columns: corrected.col_count(),
        ratio_columns: ratios.table.col_count(),
        non_finite_ratios: ratios.non_finite,
        thresholded_columns: thresholded.as_ref().map(ColumnTable::col_count),
        order: sorted.order.clone(),
    };
    tracing::info!(
        "summary for {}: [rows columns] = [{} {}], {} corrected, {} ratio columns",
        name,
        rows,
        cols,
        report.corrected_columns,
        report.ratio_columns
    );

    Ok(SheetOutput {
        name: name.to_string(),
        corrected,
        ratios,
        sorted,
        thresholded,
        report,
    })
}

/// Run the pipeline on every sheet of `source`, in sheet order.
///
/// Output books are only returned for a completed run. With
/// [`SheetErrorPolicy::Skip`] a failing sheet is recorded in the report and
/// left out of every output book.
///
/// # Errors
///
/// `Cancelled` when `cancel` fires, `Config` for an invalid configuration,
/// and under [`SheetErrorPolicy::Abort`] the first sheet error.
pub fn process_workbook<S: MatrixSource + ?Sized>(
    source: &S,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> PipelineResult<BatchOutput> {
    config.validate()?;

    let mut books = OutputBooks::new(config.active_threshold().is_some());
    let mut report = BatchReport {
        window: config.window,
        trim_limit: config.trim_limit,
        threshold: config.active_threshold(),
        charts: config.add_chart,
        ..BatchReport::default()
    };

    let names = source.sheet_names();
    for (i, name) in names.iter().enumerate() {
        cancel.check()?;

        let result = load_sheet(source, name, config).and_then(|(grid, marker_row)| {
            tracing::info!("opened sheet: {} ({} of {})", name, i + 1, names.len());
            transform_sheet(name, &grid, marker_row, config, cancel)
        });

        match result {
            Ok(output) => {
                books.add(&output, config)?;
                report.sheets.push(output.report);
            }
            Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
            Err(err) if config.on_sheet_error == SheetErrorPolicy::Skip => {
                tracing::warn!("skipping sheet: {}", err);
                report.skipped.push(SkippedSheet {
                    name: name.clone(),
                    error: err.root().to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(BatchOutput { books, report })
}

fn load_sheet<S: MatrixSource + ?Sized>(
    source: &S,
    name: &str,
    config: &PipelineConfig,
) -> PipelineResult<(SheetGrid, Option<usize>)> {
    let load = || -> PipelineResult<(SheetGrid, Option<usize>)> {
        let (rows, cols) = source.dimensions(name)?;
        tracing::debug!("sheet {} has {} rows and {} columns", name, rows, cols);
        let marker_row = source.first_row_matching(name, &config.marker_label)?;
        Ok((source.rows(name)?, marker_row))
    };
    load().map_err(|e| e.in_sheet(name))
}
