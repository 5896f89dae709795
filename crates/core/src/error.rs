//! Error types for the ratio pipeline.

use ratiobook_sheet::SheetError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while transforming a workbook.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A cell that must hold a decimal number does not parse.
    ///
    /// `row` is 1-based and `column` is a letter label, as shown in a
    /// spreadsheet program.
    #[error("Malformed number {value:?} at {column}{row}")]
    DataFormat {
        row: usize,
        column: String,
        value: String,
    },

    /// The background column selected for a data column falls outside the
    /// trailing background block.
    #[error(
        "Background offset {offset} for source column {column} is outside the \
         {background_columns} trailing background columns"
    )]
    InvariantViolation {
        column: usize,
        offset: usize,
        background_columns: usize,
    },

    /// A column ordinal cannot be given a letter label.
    #[error("Column ordinal {ordinal} is outside the supported range 1..={max}")]
    OutOfRange { ordinal: usize, max: usize },

    /// The data-start marker is absent from column 0. Recovered by the
    /// pipeline, which then starts at row 0.
    #[error("Did not find a row labelled {label:?} in column A")]
    MissingMarkerRow { label: String },

    /// The peak-search window contains no data rows.
    #[error("Peak window [{start}, {stop}) is empty for a ratio sheet with {rows} rows")]
    EmptyWindow {
        start: usize,
        stop: usize,
        rows: usize,
    },

    /// The batch was cancelled before it completed.
    #[error("Processing cancelled")]
    Cancelled,

    /// A failure inside one sheet, tagged with the sheet name.
    #[error("Sheet '{sheet}': {source}")]
    InSheet {
        sheet: String,
        #[source]
        source: Box<PipelineError>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workbook access error.
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Create a data format error for a cell.
    pub fn data_format(row: usize, column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DataFormat {
            row,
            column: column.into(),
            value: value.into(),
        }
    }

    /// Attach the sheet name to an error raised while processing it.
    #[must_use]
    pub fn in_sheet(self, sheet: &str) -> Self {
        match self {
            Self::InSheet { .. } | Self::Cancelled => self,
            other => Self::InSheet {
                sheet: sheet.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, without the sheet tag.
    #[must_use]
    pub fn root(&self) -> &PipelineError {
        match self {
            Self::InSheet { source, .. } => source.root(),
            other => other,
        }
    }
}
