use ratiobook_sheet::{Book, CellValue, LineChart, Sheet, SheetError};
use tempfile::tempdir;

// ===== Book Round Trips =====

#[test]
fn test_book_xlsx_roundtrip_keeps_sheet_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut book = Book::new();
    book.add_sheet("Zeta", Sheet::from_data(vec![vec![1, 2, 3]]))
        .unwrap();
    book.add_sheet("Alpha", Sheet::from_data(vec![vec!["a", "b"]]))
        .unwrap();
    book.save_as_xlsx(&path).unwrap();

    let loaded = Book::from_xlsx(&path).unwrap();
    assert_eq!(loaded.name(), "book");
    assert_eq!(loaded.sheet_names(), vec!["Zeta", "Alpha"]);

    let zeta = loaded.get_sheet("Zeta").unwrap();
    assert_eq!(zeta.col_count(), 3);
    assert_eq!(zeta.get(0, 2).unwrap().as_float(), Some(3.0));
}

#[test]
fn test_empty_book_still_saves() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");

    Book::new().save_as_xlsx(&path).unwrap();

    let loaded = Book::from_xlsx(&path).unwrap();
    assert_eq!(loaded.sheet_count(), 1);
    assert!(loaded.sheets().all(|(_, sheet)| sheet.is_empty()));
}

#[test]
fn test_recording_layout_survives_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recording.xlsx");

    let mut sheet = Sheet::new();
    sheet.set_a1("A1", "Experiment 7").unwrap();
    sheet.set_a1("A3", "Time (sec)").unwrap();
    sheet.set_a1("B3", "340 ROI 1").unwrap();
    sheet.set_a1("A4", 0.0).unwrap();
    sheet.set_a1("B4", 812.25).unwrap();

    let mut book = Book::new();
    book.add_sheet("Coverslip 1", sheet).unwrap();
    book.save_as_xlsx(&path).unwrap();

    let loaded = Book::from_xlsx(&path).unwrap();
    let sheet = loaded.get_sheet("Coverslip 1").unwrap();
    assert_eq!(sheet.first_row_matching("Time (sec)"), Some(2));
    assert_eq!(sheet.get_a1("B4").unwrap().as_str(), "812.25");
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = Book::from_xlsx(dir.path().join("nope.xlsx"));
    assert!(matches!(result, Err(SheetError::Xlsx(_))));
}

#[test]
fn test_chart_with_no_series_is_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nochart.xlsx");

    let mut sheet = Sheet::from_data(vec![vec![1.0], vec![2.0]]);
    sheet.add_line_chart(LineChart::new("Response Profile", "A470"));
    assert_eq!(sheet.charts().len(), 1);
    let mut book = Book::new();
    book.add_sheet("Plot", sheet).unwrap();
    book.save_as_xlsx(&path).unwrap();

    assert!(path.exists());
}

// ===== Cell Serialization =====

#[test]
fn test_cell_value_serializes_untagged() {
    let row = vec![
        CellValue::String("cell 1".to_string()),
        CellValue::Float(1.5),
        CellValue::Null,
    ];
    let json = serde_json::to_string(&row).unwrap();
    assert_eq!(json, r#"["cell 1",1.5,null]"#);
}
