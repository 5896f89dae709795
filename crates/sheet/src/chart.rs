//! Line chart descriptions attached to a sheet and rendered on save.

/// One plotted column of a line chart.
///
/// The series takes its name from `name_row` and its values from
/// `first_row..=last_row` of the same column. All indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub col: usize,
    pub name_row: usize,
    pub first_row: usize,
    pub last_row: usize,
}

/// A line chart over columns of the sheet it is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    /// Top-left cell of the chart in A1 notation
    pub anchor: String,
    pub width: u32,
    pub height: u32,
    pub series: Vec<ChartSeries>,
}

impl LineChart {
    /// Create an empty line chart anchored at `anchor`.
    #[must_use]
    pub fn new(title: &str, anchor: &str) -> Self {
        LineChart {
            title: title.to_string(),
            anchor: anchor.to_string(),
            width: 480,
            height: 288,
            series: Vec::new(),
        }
    }

    /// Set the chart size in pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Add a series for `col`, named by the header row above `first_row`.
    #[must_use]
    pub fn with_series(mut self, col: usize, first_row: usize, last_row: usize) -> Self {
        self.series.push(ChartSeries {
            col,
            name_row: first_row.saturating_sub(1),
            first_row,
            last_row,
        });
        self
    }
}
