use crate::a1_notation::parse_a1;
use crate::cell::CellValue;
use crate::chart::LineChart;
use crate::error::{Result, SheetError};

/// A sheet representing a 2D grid of cells (row-major storage)
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    data: Vec<Vec<CellValue>>,
    charts: Vec<LineChart>,
}

impl Sheet {
    /// Create a new empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::with_name("Sheet1")
    }

    /// Create a new empty sheet with a name
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            data: Vec::new(),
            charts: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let converted: Vec<Vec<CellValue>> = data
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        Sheet {
            name: "Sheet1".to_string(),
            data: converted,
            charts: Vec::new(),
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Get the number of columns (length of the first row)
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// Check if the sheet is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // ===== Cell Access =====

    /// Get a cell value by row and column index (0-based)
    pub fn get(&self, row: usize, col: usize) -> Result<&CellValue> {
        self.data
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(SheetError::IndexOutOfBounds {
                row,
                col,
                rows: self.row_count(),
                cols: self.col_count(),
            })
    }

    /// Set a cell value by row and column index (0-based)
    ///
    /// The grid grows to fit the cell; new cells are `Null` and every row
    /// keeps the same width.
    pub fn set<T: Into<CellValue>>(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.ensure_size(row + 1, col + 1);
        self.data[row][col] = value.into();
        Ok(())
    }

    /// Get a cell value using A1-style notation (e.g., "A1", "B2")
    pub fn get_a1(&self, notation: &str) -> Result<&CellValue> {
        let (row, col) = parse_a1(notation)?;
        self.get(row, col)
    }

    /// Set a cell value using A1-style notation, growing the grid as needed
    pub fn set_a1<T: Into<CellValue>>(&mut self, notation: &str, value: T) -> Result<()> {
        let (row, col) = parse_a1(notation)?;
        self.set(row, col, value)
    }

    fn ensure_size(&mut self, rows: usize, cols: usize) {
        if rows <= self.data.len() && cols <= self.col_count() {
            return;
        }

        let width = self.col_count().max(cols);
        if self.data.len() < rows {
            self.data.resize_with(rows, Vec::new);
        }
        for row in &mut self.data {
            if row.len() < width {
                row.resize(width, CellValue::Null);
            }
        }
    }

    // ===== Rows and Columns =====

    /// Get an entire column by index (0-based); short rows yield `Null`
    pub fn column(&self, index: usize) -> Result<Vec<CellValue>> {
        if index >= self.col_count() {
            return Err(SheetError::ColumnIndexOutOfBounds {
                index,
                count: self.col_count(),
            });
        }

        Ok(self
            .data
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect())
    }

    /// Index of the first row whose first cell reads `label`
    #[must_use]
    pub fn first_row_matching(&self, label: &str) -> Option<usize> {
        self.data
            .iter()
            .position(|row| row.first().is_some_and(|cell| cell.as_str() == label))
    }

    /// Get rows iterator
    pub fn rows(&self) -> impl Iterator<Item = &Vec<CellValue>> {
        self.data.iter()
    }

    /// Get internal data reference
    #[must_use]
    pub fn data(&self) -> &Vec<Vec<CellValue>> {
        &self.data
    }

    /// Get mutable internal data reference
    pub fn data_mut(&mut self) -> &mut Vec<Vec<CellValue>> {
        &mut self.data
    }

    // ===== Charts =====

    /// Attach a line chart, rendered when the sheet is saved to Excel
    pub fn add_line_chart(&mut self, chart: LineChart) {
        self.charts.push(chart);
    }

    /// Charts attached to this sheet
    #[must_use]
    pub fn charts(&self) -> &[LineChart] {
        &self.charts
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_grows_rectangular() {
        let mut sheet = Sheet::new();
        sheet.set(2, 1, 5.0).unwrap();

        assert_eq!(sheet.row_count(), 3);
        assert!(sheet.rows().all(|row| row.len() == 2));
        assert_eq!(sheet.get(2, 1).unwrap(), &CellValue::Float(5.0));
        assert!(sheet.get(0, 0).unwrap().is_null());

        sheet.set(0, 3, "x").unwrap();
        assert!(sheet.rows().all(|row| row.len() == 4));
    }

    #[test]
    fn test_set_inside_grid_keeps_shape() {
        let mut sheet = Sheet::from_data(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        sheet.set(1, 1, 0.5).unwrap();
        sheet.set(0, 2, "x").unwrap();

        assert_eq!(sheet.row_count(), 2);
        assert!(sheet.rows().all(|row| row.len() == 3));
        assert_eq!(sheet.get(1, 1).unwrap(), &CellValue::Float(0.5));
    }

    #[test]
    fn test_filling_tall_sheet_by_cell() {
        let mut sheet = Sheet::new();
        for col in 0..20 {
            sheet.set(0, col, "header").unwrap();
        }
        for row in 1..=50_000 {
            for col in 0..20 {
                sheet.set(row, col, row as f64).unwrap();
            }
        }

        assert_eq!((sheet.row_count(), sheet.col_count()), (50_001, 20));
        assert_eq!(sheet.get(50_000, 19).unwrap(), &CellValue::Float(50_000.0));
    }

    #[test]
    fn test_set_a1() {
        let mut sheet = Sheet::new();
        sheet.set_a1("B3", "hello").unwrap();
        sheet.set_a1("AA1", 1).unwrap();

        assert_eq!(sheet.get(2, 1).unwrap().as_str(), "hello");
        assert_eq!(sheet.get_a1("AA1").unwrap(), &CellValue::Int(1));
        assert!(sheet.set_a1("3B", 0).is_err());
    }

    #[test]
    fn test_get_out_of_bounds() {
        let sheet = Sheet::from_data(vec![vec![1, 2]]);
        assert!(matches!(
            sheet.get(1, 0),
            Err(SheetError::IndexOutOfBounds { rows: 1, cols: 2, .. })
        ));
    }

    #[test]
    fn test_first_row_matching() {
        let sheet = Sheet::from_data(vec![
            vec!["Experiment", ""],
            vec!["", ""],
            vec!["Time (sec)", "340"],
            vec!["Time (sec)", "380"],
        ]);

        assert_eq!(sheet.first_row_matching("Time (sec)"), Some(2));
        assert_eq!(sheet.first_row_matching("Missing"), None);
    }

    #[test]
    fn test_column_pads_short_rows() {
        let mut sheet = Sheet::from_data(vec![vec![1, 2, 3]]);
        sheet.data_mut().push(vec![CellValue::Int(4)]);

        let col = sheet.column(2).unwrap();
        assert_eq!(col, vec![CellValue::Int(3), CellValue::Null]);
        assert!(sheet.column(3).is_err());
    }
}
