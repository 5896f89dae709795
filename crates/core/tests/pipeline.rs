use chrono::{TimeZone, Utc};
use ratiobook_core::grid::MatrixSource;
use ratiobook_core::output::OutputPaths;
use ratiobook_core::{
    process_workbook, CancelToken, PeakWindow, PipelineConfig, PipelineError, PipelineResult,
    SheetErrorPolicy, SheetGrid,
};
use ratiobook_sheet::{Book, CellValue, Sheet, NON_FINITE_TEXT};
use std::cell::RefCell;
use tempfile::tempdir;

const HEADER: [&str; 8] = [
    "Time (sec)", "340 a", "380 a", "unused", "340 b", "380 b", "bg 340", "bg 380",
];

/// Two notes rows, the header row, then `data_rows` samples. The second
/// cell pair reads `c4` and `c5` on every row.
fn recording(data_rows: usize, c4: f64, c5: f64) -> Sheet {
    let mut data: Vec<Vec<CellValue>> = vec![
        {
            let mut row = vec![CellValue::Null; 8];
            row[0] = "Experiment 7".into();
            row
        },
        vec![CellValue::Null; 8],
        HEADER.iter().map(|h| (*h).into()).collect(),
    ];
    for r in 0..data_rows {
        let t = r as f64;
        data.push(
            [t, 100.0 + 10.0 * t, 50.0, 0.0, c4, c5, 10.0, 5.0]
                .into_iter()
                .map(CellValue::from)
                .collect(),
        );
    }
    Sheet::from_data(data)
}

fn config() -> PipelineConfig {
    PipelineConfig {
        window: PeakWindow::new(1, 100),
        ..PipelineConfig::default()
    }
}

fn float(book: &Book, sheet: &str, cell: &str) -> Option<f64> {
    book.get_sheet(sheet).unwrap().get_a1(cell).unwrap().as_float()
}

fn text(book: &Book, sheet: &str, cell: &str) -> String {
    book.get_sheet(sheet).unwrap().get_a1(cell).unwrap().as_str()
}

// ===== Whole Workbook =====

#[test]
fn test_workbook_through_xlsx() {
    let dir = tempdir().unwrap();
    let source_path = dir.path().join("coverslips.xlsx");

    let mut source = Book::new();
    source.add_sheet("Coverslip 1", recording(10, 110.0, 15.0)).unwrap();
    source.add_sheet("Coverslip 2", recording(4, 20.0, 15.0)).unwrap();
    source.save_as_xlsx(&source_path).unwrap();

    let source = Book::from_xlsx(&source_path).unwrap();
    let batch = process_workbook(&source, &config(), &CancelToken::new()).unwrap();

    assert_eq!(batch.report.processed(), 2);
    assert!(batch.report.skipped.is_empty());
    let first = &batch.report.sheets[0];
    assert_eq!(first.name, "Coverslip 1");
    assert_eq!(first.data_start, 2);
    assert_eq!(first.corrected_columns, 4);
    assert_eq!(first.ratio_columns, 2);

    let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
    let paths = OutputPaths::timestamped(dir.path(), &at, false);
    let saved = batch.books.save_all(&paths).unwrap();
    assert_eq!(saved.len(), 3);
    assert!(dir.path().join("2024March5_14h7min9s_sorted_ratios.xlsx").exists());

    let transformed = Book::from_xlsx(&paths.transformed).unwrap();
    assert_eq!(transformed.sheet_names(), vec!["Coverslip 1", "Coverslip 2"]);
    assert_eq!(text(&transformed, "Coverslip 1", "A1"), "340 a");
    assert_eq!(text(&transformed, "Coverslip 1", "C1"), "340 b");
    assert_eq!(float(&transformed, "Coverslip 1", "A2"), Some(90.0));
    assert_eq!(float(&transformed, "Coverslip 1", "D11"), Some(10.0));

    // (90 + 10t) / 45 peaks at 4.0, the constant 100 / 10 ratio is 10.0
    let ratios = Book::from_xlsx(&paths.ratios).unwrap();
    assert_eq!(text(&ratios, "Coverslip 1", "A1"), "cell 1");
    assert_eq!(float(&ratios, "Coverslip 1", "A2"), Some(2.0));
    assert_eq!(float(&ratios, "Coverslip 1", "B2"), Some(10.0));

    let sorted = Book::from_xlsx(&paths.sorted).unwrap();
    assert_eq!(text(&sorted, "Coverslip 1", "A1"), "cell 2");
    assert_eq!(text(&sorted, "Coverslip 1", "B1"), "cell 1");
    assert_eq!(float(&sorted, "Coverslip 1", "A2"), Some(10.0));
    assert_eq!(float(&sorted, "Coverslip 1", "B11"), Some(4.0));

    // 10 / 10 never beats (90 + 10t) / 45 on the second sheet
    assert_eq!(text(&sorted, "Coverslip 2", "A1"), "cell 1");
    assert_eq!(
        batch.report.sheets[1].order_line(),
        format!("ordered values for Coverslip 2: cell 1: {} cell 2: 1", 120.0 / 45.0)
    );
}

#[test]
fn test_six_column_recording() {
    let mut rows = vec![vec![String::new(); 6]; 2];
    rows.push(
        ["Time (sec)", "340", "380", "x", "bg 340", "bg 380"]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    );
    for r in 0..10 {
        let t = f64::from(r);
        rows.push(
            [t, 20.0 + t, 6.0, 0.0, 2.0, 1.0]
                .iter()
                .map(f64::to_string)
                .collect(),
        );
    }
    let source = Fixtures(vec![("Recording".to_string(), SheetGrid::new(rows))]);

    let batch = process_workbook(&source, &config(), &CancelToken::new()).unwrap();
    let report = &batch.report.sheets[0];
    assert_eq!(report.data_start, 2);
    assert_eq!(report.corrected_columns, 2);
    assert_eq!(report.ratio_columns, 1);

    let corrected = batch.books.transformed.get_sheet("Recording").unwrap();
    assert_eq!((corrected.row_count(), corrected.col_count()), (11, 2));
    let ratios = batch.books.ratios.get_sheet("Recording").unwrap();
    let sorted = batch.books.sorted.get_sheet("Recording").unwrap();
    assert_eq!((ratios.row_count(), ratios.col_count()), (11, 1));
    assert_eq!(ratios.data(), sorted.data());
    // (20 + t - 2) / (6 - 1)
    assert_eq!(ratios.get_a1("A11").unwrap().as_float(), Some(27.0 / 5.0));
}

#[test]
fn test_sorted_sheet_is_column_permutation_of_ratios() {
    let mut source = Book::new();
    source.add_sheet("S", recording(8, 60.0, 9.0)).unwrap();
    let batch = process_workbook(&source, &config(), &CancelToken::new()).unwrap();

    let ratios = batch.books.ratios.get_sheet("S").unwrap();
    let sorted = batch.books.sorted.get_sheet("S").unwrap();
    assert_eq!(ratios.row_count(), sorted.row_count());
    assert_eq!(ratios.col_count(), sorted.col_count());

    for (out_col, ranked) in batch.report.sheets[0].order.iter().enumerate() {
        assert_eq!(
            sorted.column(out_col).unwrap(),
            ratios.column(ranked.source_index).unwrap()
        );
    }
}

#[test]
fn test_division_by_zero_is_written_as_text() {
    let dir = tempdir().unwrap();
    let mut source = Book::new();
    // The second cell's denominator is fully covered by its background
    source.add_sheet("S", recording(3, 30.0, 5.0)).unwrap();

    let batch = process_workbook(&source, &config(), &CancelToken::new()).unwrap();
    assert_eq!(batch.report.sheets[0].non_finite_ratios, 3);
    assert_eq!(batch.report.sheets[0].order[0].header, "cell 2");

    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let paths = OutputPaths::timestamped(dir.path(), &at, false);
    batch.books.save_all(&paths).unwrap();

    let ratios = Book::from_xlsx(&paths.ratios).unwrap();
    assert_eq!(text(&ratios, "S", "B2"), NON_FINITE_TEXT);
    assert_eq!(float(&ratios, "S", "A2"), Some(2.0));
}

#[test]
fn test_threshold_workbook() {
    let dir = tempdir().unwrap();
    let mut source = Book::new();
    source.add_sheet("S", recording(10, 110.0, 15.0)).unwrap();

    let config = PipelineConfig {
        threshold: Some(5.0),
        ..config()
    };
    let batch = process_workbook(&source, &config, &CancelToken::new()).unwrap();
    assert_eq!(batch.report.threshold, Some(5.0));
    assert_eq!(batch.report.sheets[0].thresholded_columns, Some(1));

    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let paths = OutputPaths::timestamped(dir.path(), &at, true);
    assert_eq!(batch.books.save_all(&paths).unwrap().len(), 4);

    let kept = Book::from_xlsx(paths.threshold.as_ref().unwrap()).unwrap();
    assert_eq!(text(&kept, "S", "A1"), "cell 2");
    assert_eq!(kept.get_sheet("S").unwrap().col_count(), 1);
}

#[test]
fn test_charts_are_attached_to_ratio_sheets() {
    let dir = tempdir().unwrap();
    let mut source = Book::new();
    source.add_sheet("S", recording(5, 110.0, 15.0)).unwrap();

    let config = PipelineConfig {
        add_chart: true,
        ..config()
    };
    let batch = process_workbook(&source, &config, &CancelToken::new()).unwrap();

    let charts = batch.books.ratios.get_sheet("S").unwrap().charts();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].series.len(), 2);
    assert!(batch.books.sorted.get_sheet("S").unwrap().charts().is_empty());

    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    batch
        .books
        .save_all(&OutputPaths::timestamped(dir.path(), &at, false))
        .unwrap();
}

#[test]
fn test_empty_sheet_yields_empty_outputs() {
    let mut source = Book::new();
    source.add_empty_sheet("Blank").unwrap();

    let batch = process_workbook(&source, &config(), &CancelToken::new()).unwrap();
    let report = &batch.report.sheets[0];
    assert!(!report.marker_found);
    assert_eq!(report.ratio_columns, 0);
    assert!(batch.books.sorted.get_sheet("Blank").unwrap().is_empty());
}

// ===== Failure Policy =====

fn source_with_bad_sheet() -> Book {
    let mut bad = recording(4, 110.0, 15.0);
    bad.set_a1("E5", "n/a").unwrap();

    let mut source = Book::new();
    source.add_sheet("Good", recording(4, 110.0, 15.0)).unwrap();
    source.add_sheet("Bad", bad).unwrap();
    source.add_sheet("Also good", recording(4, 20.0, 15.0)).unwrap();
    source
}

#[test]
fn test_abort_on_sheet_error() {
    let err = process_workbook(&source_with_bad_sheet(), &config(), &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, PipelineError::InSheet { ref sheet, .. } if sheet == "Bad"));
    assert!(matches!(
        err.root(),
        PipelineError::DataFormat { row: 5, ref column, ref value }
            if column == "E" && value == "n/a"
    ));
}

#[test]
fn test_skip_failed_sheets() {
    let config = PipelineConfig {
        on_sheet_error: SheetErrorPolicy::Skip,
        ..config()
    };
    let batch = process_workbook(&source_with_bad_sheet(), &config, &CancelToken::new()).unwrap();

    assert_eq!(batch.report.processed(), 2);
    assert_eq!(batch.report.skipped.len(), 1);
    assert_eq!(batch.report.skipped[0].name, "Bad");
    assert!(batch.report.skipped[0].error.contains("E5"));
    assert_eq!(batch.books.ratios.sheet_names(), vec!["Good", "Also good"]);
    assert_eq!(batch.books.transformed.sheet_names(), vec!["Good", "Also good"]);
}

#[test]
fn test_empty_window_fails_the_sheet() {
    let mut source = Book::new();
    source.add_sheet("Short", recording(5, 110.0, 15.0)).unwrap();

    let err = process_workbook(&source, &PipelineConfig::default(), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err.root(), PipelineError::EmptyWindow { .. }));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = PipelineConfig {
        threshold: Some(f64::NAN),
        ..config()
    };
    assert!(matches!(
        process_workbook(&Book::new(), &config, &CancelToken::new()),
        Err(PipelineError::Config(_))
    ));
}

#[test]
fn test_cancelled_batch_has_no_output() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = process_workbook(&source_with_bad_sheet(), &config(), &cancel);
    assert!(matches!(result, Err(PipelineError::Cancelled)));
}

/// A workbook that fires `cancel` while handing out the rows of `cancel_on`.
struct CancellingSource {
    book: Book,
    cancel_on: &'static str,
    cancel: CancelToken,
    served: RefCell<Vec<String>>,
}

impl CancellingSource {
    fn new(names: &[&str], cancel_on: &'static str) -> Self {
        let mut book = Book::new();
        for name in names {
            book.add_sheet(*name, recording(6, 110.0, 15.0)).unwrap();
        }
        Self {
            book,
            cancel_on,
            cancel: CancelToken::new(),
            served: RefCell::new(Vec::new()),
        }
    }

    fn served(&self, sheet: &str) -> bool {
        self.served.borrow().iter().any(|name| name == sheet)
    }
}

impl MatrixSource for CancellingSource {
    fn sheet_names(&self) -> Vec<String> {
        MatrixSource::sheet_names(&self.book)
    }

    fn rows(&self, sheet: &str) -> PipelineResult<SheetGrid> {
        self.served.borrow_mut().push(sheet.to_string());
        if sheet == self.cancel_on {
            self.cancel.cancel();
        }
        MatrixSource::rows(&self.book, sheet)
    }
}

#[test]
fn test_cancel_mid_batch_stops_before_next_sheet() {
    let source = CancellingSource::new(&["First", "Second", "Third"], "Second");

    let result = process_workbook(&source, &config(), &source.cancel);
    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert!(source.served("First"));
    assert!(source.served("Second"));
    assert!(!source.served("Third"));
}

#[test]
fn test_cancel_during_stages_is_not_skipped() {
    // A single sheet never reaches the between-sheets check after the cancel
    let source = CancellingSource::new(&["Only"], "Only");
    let config = PipelineConfig {
        on_sheet_error: SheetErrorPolicy::Skip,
        ..config()
    };

    let result = process_workbook(&source, &config, &source.cancel);
    assert!(matches!(result, Err(PipelineError::Cancelled)));
}

// ===== Custom Sources =====

/// A source that only knows how to hand out grids.
struct Fixtures(Vec<(String, SheetGrid)>);

impl MatrixSource for Fixtures {
    fn sheet_names(&self) -> Vec<String> {
        self.0.iter().map(|(name, _)| name.clone()).collect()
    }

    fn rows(&self, sheet: &str) -> PipelineResult<SheetGrid> {
        self.0
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| PipelineError::Config(format!("no fixture {sheet}")))
    }
}

#[test]
fn test_custom_matrix_source() {
    let grid = SheetGrid::from_strs(&[
        &["Time (sec)", "a", "b", "x", "bg a", "bg b"],
        &["0", "9", "5", "0", "1", "1"],
        &["1", "17", "5", "0", "1", "1"],
    ]);
    let source = Fixtures(vec![("Fixture".to_string(), grid)]);

    let batch = process_workbook(&source, &config(), &CancelToken::new()).unwrap();
    let ratios = batch.books.ratios.get_sheet("Fixture").unwrap();
    assert_eq!(ratios.get_a1("A1").unwrap().as_str(), "cell 1");
    assert_eq!(ratios.get_a1("A3").unwrap().as_float(), Some(4.0));
}
