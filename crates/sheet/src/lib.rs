//! Sheet/Book model for ratiobook
//!
//! Provides an in-memory grid of cells, named workbooks that preserve sheet
//! order, A1-style addressing and Excel (`.xlsx`) reading and writing.
//!
//! # Examples
//!
//! ## Building a sheet cell by cell
//!
//! ```
//! use ratiobook_sheet::{Sheet, CellValue};
//!
//! let mut sheet = Sheet::with_name("Ratios");
//! sheet.set_a1("A1", "cell 1").unwrap();
//! sheet.set_a1("A2", 1.5).unwrap();
//!
//! assert_eq!(sheet.row_count(), 2);
//! assert_eq!(sheet.get_a1("A2").unwrap(), &CellValue::Float(1.5));
//! ```
//!
//! ## Working with books
//!
//! ```
//! use ratiobook_sheet::{Book, Sheet};
//!
//! let mut book = Book::new();
//! book.add_sheet("Coverslip 1", Sheet::new()).unwrap();
//! book.add_sheet("Coverslip 2", Sheet::new()).unwrap();
//!
//! assert_eq!(book.sheet_names(), vec!["Coverslip 1", "Coverslip 2"]);
//! ```
//!
//! ## Loading from Excel
//!
//! ```no_run
//! use ratiobook_sheet::Book;
//!
//! let book = Book::from_xlsx("recording.xlsx").unwrap();
//! ```

mod a1_notation;
mod book;
mod cell;
mod chart;
mod error;
mod sheet;
mod xlsx;

/// Re-export A1 notation helpers.
pub use a1_notation::{column_index_to_letters, parse_a1};
/// Re-export book type.
pub use book::Book;
/// Re-export cell value type.
pub use cell::CellValue;
/// Re-export chart descriptions.
pub use chart::{ChartSeries, LineChart};
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet type.
pub use sheet::Sheet;
/// Re-export the placeholder written for non-finite numbers.
pub use xlsx::NON_FINITE_TEXT;
