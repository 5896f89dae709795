//! Column-indexed numeric tables produced by the pipeline stages.

use crate::column::column_label;
use crate::error::{PipelineError, PipelineResult};
use ratiobook_sheet::{CellValue, Sheet};

/// One output column: letter label, header text and data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub header: String,
    pub values: Vec<f64>,
}

/// A table of labelled numeric columns with a text header row.
///
/// In sheet coordinates row 0 is the header row and data row `i` sits at
/// row `i + 1`. Column labels are assigned contiguously from `A` as columns
/// are pushed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    columns: Vec<Column>,
}

impl ColumnTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column under the next free label.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` once every label is taken.
    pub fn push(&mut self, header: impl Into<String>, values: Vec<f64>) -> PipelineResult<&Column> {
        let label = column_label(self.columns.len() + 1)?;
        self.columns.push(Column {
            label,
            header: header.into(),
            values,
        });
        Ok(&self.columns[self.columns.len() - 1])
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> PipelineResult<&Column> {
        self.columns.get(index).ok_or(PipelineError::OutOfRange {
            ordinal: index + 1,
            max: self.columns.len(),
        })
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows in sheet coordinates: the header row plus the longest column.
    /// An empty table has no rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.len() + 1)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    /// Write the table into a new sheet: headers in row 0, then data rows.
    /// Cells below the end of a shorter column stay empty.
    ///
    /// # Errors
    ///
    /// Propagates sheet construction failures.
    pub fn to_sheet(&self, name: &str) -> PipelineResult<Sheet> {
        let mut data = vec![vec![CellValue::Null; self.col_count()]; self.row_count()];
        for (col, column) in self.columns.iter().enumerate() {
            data[0][col] = column.header.as_str().into();
            for (i, value) in column.values.iter().enumerate() {
                data[i + 1][col] = CellValue::Float(*value);
            }
        }

        let mut sheet = Sheet::from_data(data);
        sheet.set_name(name);
        Ok(sheet)
    }
}
