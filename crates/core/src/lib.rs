//! # ratiobook-core
//!
//! Batch transformation of fluorescence-ratio recordings.
//!
//! Every sheet of a source workbook goes through the same stages:
//! - background correction of the recording columns ([`background`])
//! - paired ratios of the corrected columns ([`ratio`])
//! - reordering of the ratio columns by peak response ([`peak`])
//! - an optional response-threshold filter ([`threshold`])
//!
//! [`pipeline::process_workbook`] drives a whole workbook and
//! [`output`] writes the resulting workbooks.

pub mod background;
pub mod column;
pub mod config;
/// Error types and result aliases.
pub mod error;
pub mod grid;
pub mod output;
pub mod peak;
pub mod pipeline;
pub mod ratio;
pub mod table;
pub mod threshold;

pub use column::{column_label, MAX_COLUMN_ORDINAL};
pub use config::{ChartLayout, ColumnLayout, PeakWindow, PipelineConfig, SheetErrorPolicy};
pub use error::{PipelineError, PipelineResult};
pub use grid::{MatrixSource, SheetGrid};
pub use output::OutputPaths;
pub use peak::{RankedColumn, SortedMatrix};
pub use pipeline::{
    process_sheet, process_workbook, BatchOutput, BatchReport, CancelToken, OutputBooks,
    SheetOutput, SheetReport,
};
pub use ratio::RatioMatrix;
pub use table::{Column, ColumnTable};
