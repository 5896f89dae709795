use crate::a1_notation::parse_a1;
use crate::book::Book;
use crate::cell::CellValue;
use crate::chart::LineChart;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Chart, ChartType, Workbook, Worksheet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Text written in place of infinite or NaN numbers, which Excel cannot store
pub const NON_FINITE_TEXT: &str = "#DIV/0!";

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel stores dates as days since 1899-12-30
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

/// Convert a calamine range into a sheet, keeping absolute cell positions.
///
/// calamine trims leading empty rows and columns from the used range; they
/// are restored as `Null` cells so that row and column indices match the
/// spreadsheet.
fn range_to_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::with_name(name);
    let Some((start_row, start_col)) = range.start() else {
        return sheet;
    };

    let lead_rows = start_row as usize;
    let lead_cols = start_col as usize;
    let width = lead_cols + range.width();

    let data = sheet.data_mut();
    data.extend((0..lead_rows).map(|_| vec![CellValue::Null; width]));
    for row in range.rows() {
        let mut cells = vec![CellValue::Null; lead_cols];
        cells.extend(row.iter().map(data_to_cell_value));
        data.push(cells);
    }

    sheet
}

fn open_xlsx(path: &Path) -> Result<Xlsx<BufReader<File>>> {
    open_workbook(path).map_err(SheetError::xlsx)
}

/// Write sheet data and charts to a worksheet
fn write_sheet(worksheet: &mut Worksheet, name: &str, sheet: &Sheet) -> Result<()> {
    worksheet.set_name(name).map_err(SheetError::xlsx)?;

    for (row_idx, row) in sheet.data().iter().enumerate() {
        let row_num =
            u32::try_from(row_idx).map_err(|_| SheetError::xlsx("Row index overflow"))?;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num =
                u16::try_from(col_idx).map_err(|_| SheetError::xlsx("Column index overflow"))?;

            match cell {
                CellValue::Null => {}
                CellValue::Bool(b) => {
                    worksheet
                        .write_boolean(row_num, col_num, *b)
                        .map_err(SheetError::xlsx)?;
                }
                CellValue::Int(i) => {
                    // Excel stores all numbers as f64
                    worksheet
                        .write_number(row_num, col_num, *i as f64)
                        .map_err(SheetError::xlsx)?;
                }
                CellValue::Float(f) if !f.is_finite() => {
                    worksheet
                        .write_string(row_num, col_num, NON_FINITE_TEXT)
                        .map_err(SheetError::xlsx)?;
                }
                CellValue::Float(f) => {
                    worksheet
                        .write_number(row_num, col_num, *f)
                        .map_err(SheetError::xlsx)?;
                }
                CellValue::String(s) => {
                    worksheet
                        .write_string(row_num, col_num, s)
                        .map_err(SheetError::xlsx)?;
                }
            }
        }
    }

    for chart in sheet.charts() {
        insert_line_chart(worksheet, name, chart)?;
    }

    Ok(())
}

fn insert_line_chart(worksheet: &mut Worksheet, sheet_name: &str, line_chart: &LineChart) -> Result<()> {
    if line_chart.series.is_empty() {
        return Ok(());
    }

    let mut chart = Chart::new(ChartType::Line);
    for series in &line_chart.series {
        let col = u16::try_from(series.col).map_err(|_| SheetError::xlsx("Column index overflow"))?;
        let name_row =
            u32::try_from(series.name_row).map_err(|_| SheetError::xlsx("Row index overflow"))?;
        let first_row =
            u32::try_from(series.first_row).map_err(|_| SheetError::xlsx("Row index overflow"))?;
        let last_row =
            u32::try_from(series.last_row).map_err(|_| SheetError::xlsx("Row index overflow"))?;

        chart
            .add_series()
            .set_name((sheet_name, name_row, col))
            .set_values((sheet_name, first_row, col, last_row, col));
    }
    chart.title().set_name(line_chart.title.as_str());
    chart.set_width(line_chart.width).set_height(line_chart.height);

    let (row, col) = parse_a1(&line_chart.anchor)?;
    let row = u32::try_from(row).map_err(|_| SheetError::xlsx("Row index overflow"))?;
    let col = u16::try_from(col).map_err(|_| SheetError::xlsx("Column index overflow"))?;
    worksheet
        .insert_chart(row, col, &chart)
        .map_err(SheetError::xlsx)?;

    Ok(())
}

impl Book {
    /// Load a book from an Excel file (all sheets, in workbook order)
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_xlsx(path)?;

        let sheet_names: Vec<String> = workbook.sheet_names().iter().map(|s| s.to_string()).collect();
        let book_name = path
            .file_stem()
            .map_or_else(|| "Book1".to_string(), |s| s.to_string_lossy().into_owned());
        let mut book = Book::with_name(&book_name);

        for sheet_name in sheet_names {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(SheetError::xlsx)?;
            book.add_sheet(&sheet_name, range_to_sheet(&sheet_name, &range))?;
        }

        Ok(book)
    }

    /// Save the book to an Excel file
    ///
    /// Excel requires at least one worksheet, so an empty book is written
    /// with a single blank sheet.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut workbook = Workbook::new();

        for (name, sheet) in self.sheets() {
            let worksheet = workbook.add_worksheet();
            write_sheet(worksheet, name, sheet)?;
        }
        if self.is_empty() {
            workbook.add_worksheet();
        }

        workbook.save(path.as_ref()).map_err(SheetError::xlsx)
    }
}
