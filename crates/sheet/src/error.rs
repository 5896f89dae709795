use thiserror::Error;

/// Errors that can occur during sheet and workbook operations
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Index out of bounds: row {row}, col {col} (sheet has {rows} rows, {cols} cols)")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Column index out of bounds: {index} (sheet has {count} columns)")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Invalid cell notation: {0}")]
    InvalidCellNotation(String),

    #[error("Excel error: {0}")]
    Xlsx(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Wrap an error raised by the Excel reader or writer.
    pub(crate) fn xlsx(err: impl std::fmt::Display) -> Self {
        SheetError::Xlsx(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
