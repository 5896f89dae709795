//! Read access to source sheets as grids of text cells.

use crate::error::{PipelineError, PipelineResult};
use ratiobook_sheet::{column_index_to_letters, Book, Sheet};

/// The raw cell grid of one source sheet.
///
/// Numbers read from a workbook are kept in their shortest round-trip text
/// form, so parsing a cell back yields the stored value exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a grid from string slices, mostly for tests and fixtures.
    #[must_use]
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
    }

    #[must_use]
    pub fn from_sheet(sheet: &Sheet) -> Self {
        Self::new(
            sheet
                .rows()
                .map(|row| row.iter().map(|cell| cell.as_str()).collect())
                .collect(),
        )
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column count, taken from the first row.
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// `(rows, cols)`
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.row_count(), self.col_count())
    }

    /// Cell text, or `""` when the row is shorter than `col`.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", String::as_str)
    }

    /// Parse a cell as a decimal number.
    ///
    /// # Errors
    ///
    /// Returns `DataFormat` naming the cell in spreadsheet coordinates.
    pub fn number(&self, row: usize, col: usize) -> PipelineResult<f64> {
        let text = self.cell(row, col);
        text.trim()
            .parse::<f64>()
            .map_err(|_| PipelineError::data_format(row + 1, column_index_to_letters(col), text))
    }

    /// Index of the first row whose column-0 cell equals `label`.
    #[must_use]
    pub fn first_row_matching(&self, label: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.first().is_some_and(|cell| cell == label))
    }
}

/// Source of sheet grids, addressed by sheet name.
pub trait MatrixSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Raw cell grid of a sheet.
    fn rows(&self, sheet: &str) -> PipelineResult<SheetGrid>;

    /// Index of the first row whose column-0 cell equals `label`.
    fn first_row_matching(&self, sheet: &str, label: &str) -> PipelineResult<Option<usize>> {
        Ok(self.rows(sheet)?.first_row_matching(label))
    }

    /// `(rows, cols)` of a sheet.
    fn dimensions(&self, sheet: &str) -> PipelineResult<(usize, usize)> {
        Ok(self.rows(sheet)?.dimensions())
    }
}

impl MatrixSource for Book {
    fn sheet_names(&self) -> Vec<String> {
        Book::sheet_names(self)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn rows(&self, sheet: &str) -> PipelineResult<SheetGrid> {
        Ok(SheetGrid::from_sheet(self.get_sheet(sheet)?))
    }

    fn first_row_matching(&self, sheet: &str, label: &str) -> PipelineResult<Option<usize>> {
        Ok(self.get_sheet(sheet)?.first_row_matching(label))
    }

    fn dimensions(&self, sheet: &str) -> PipelineResult<(usize, usize)> {
        let sheet = self.get_sheet(sheet)?;
        Ok((sheet.row_count(), sheet.col_count()))
    }
}
