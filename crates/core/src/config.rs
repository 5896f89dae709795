//! Pipeline configuration.
//!
//! Every layout assumption of the recording format lives here as a named
//! setting with its default. Configuration can be loaded from a JSON or YAML
//! file; missing fields take their defaults.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Label in column A that marks the header row of the data block.
pub const DEFAULT_MARKER_LABEL: &str = "Time (sec)";

/// Column layout of a source sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnLayout {
    /// Every source column whose index is a multiple of this is skipped
    #[serde(default = "default_skip_period")]
    pub skip_period: usize,

    /// Number of trailing background columns
    #[serde(default = "default_background_columns")]
    pub background_columns: usize,
}

fn default_skip_period() -> usize {
    3
}

fn default_background_columns() -> usize {
    2
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            skip_period: default_skip_period(),
            background_columns: default_background_columns(),
        }
    }
}

/// Row window `[start, stop)` searched for peaks, in ratio-sheet rows
/// (row 0 is the header row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeakWindow {
    #[serde(default = "default_window_start")]
    pub start: usize,

    #[serde(default = "default_window_stop")]
    pub stop: usize,
}

fn default_window_start() -> usize {
    30
}

fn default_window_stop() -> usize {
    360
}

impl PeakWindow {
    #[must_use]
    pub fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }
}

impl Default for PeakWindow {
    fn default() -> Self {
        Self::new(default_window_start(), default_window_stop())
    }
}

/// One line chart: `columns` ratio columns starting at `first_column`
/// (0-based), placed at `anchor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartGroup {
    pub anchor: String,
    pub first_column: usize,
    pub columns: usize,
}

/// Line charts added to each ratio sheet when charts are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartLayout {
    #[serde(default = "default_chart_title")]
    pub title: String,

    #[serde(default = "default_chart_width")]
    pub width: u32,

    #[serde(default = "default_chart_height")]
    pub height: u32,

    /// Last plotted row, 1-based as in the spreadsheet
    #[serde(default = "default_chart_last_row")]
    pub last_row: usize,

    #[serde(default = "default_chart_groups")]
    pub groups: Vec<ChartGroup>,
}

fn default_chart_title() -> String {
    "Response Profile".to_string()
}

fn default_chart_width() -> u32 {
    1040
}

fn default_chart_height() -> u32 {
    640
}

fn default_chart_last_row() -> usize {
    470
}

fn default_chart_groups() -> Vec<ChartGroup> {
    vec![
        ChartGroup {
            anchor: "A470".to_string(),
            first_column: 0,
            columns: 6,
        },
        ChartGroup {
            anchor: "R470".to_string(),
            first_column: 6,
            columns: 6,
        },
    ]
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            title: default_chart_title(),
            width: default_chart_width(),
            height: default_chart_height(),
            last_row: default_chart_last_row(),
            groups: default_chart_groups(),
        }
    }
}

/// What the batch driver does when one sheet fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetErrorPolicy {
    /// Abort the whole workbook run (no output files)
    #[default]
    Abort,
    /// Record the failure, leave the sheet out, and continue
    Skip,
}

/// Settings for one workbook run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Column-A label of the header row
    #[serde(default = "default_marker_label")]
    pub marker_label: String,

    #[serde(default)]
    pub layout: ColumnLayout,

    /// Maximum number of data rows per ratio column
    #[serde(default = "default_trim_limit")]
    pub trim_limit: usize,

    #[serde(default)]
    pub window: PeakWindow,

    /// Response threshold for the optional threshold workbook; `None` or 0
    /// disables it
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Print the peak order of every sheet
    #[serde(default = "default_print_order")]
    pub print_order: bool,

    /// Add line charts to the ratio workbook
    #[serde(default)]
    pub add_chart: bool,

    #[serde(default)]
    pub charts: ChartLayout,

    #[serde(default)]
    pub on_sheet_error: SheetErrorPolicy,
}

fn default_marker_label() -> String {
    DEFAULT_MARKER_LABEL.to_string()
}

fn default_trim_limit() -> usize {
    450
}

fn default_print_order() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            marker_label: default_marker_label(),
            layout: ColumnLayout::default(),
            trim_limit: default_trim_limit(),
            window: PeakWindow::default(),
            threshold: None,
            print_order: default_print_order(),
            add_chart: false,
            charts: ChartLayout::default(),
            on_sheet_error: SheetErrorPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Config` if it does not
    /// parse or fails validation.
    pub fn from_path<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config: Self = match extension.as_deref() {
            Some("json") => serde_json::from_str(&text)
                .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&text)
                .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?,
            _ => {
                return Err(PipelineError::Config(format!(
                    "{}: expected a .json, .yaml or .yml file",
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make every sheet fail.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first invalid setting.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.layout.skip_period < 2 {
            return Err(PipelineError::Config(format!(
                "layout.skip_period must be at least 2, got {}",
                self.layout.skip_period
            )));
        }
        if self.layout.background_columns == 0 {
            return Err(PipelineError::Config(
                "layout.background_columns must be at least 1".to_string(),
            ));
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(PipelineError::Config(format!(
                    "threshold must be a non-negative number, got {threshold}"
                )));
            }
        }
        Ok(())
    }

    /// Threshold to apply, if the threshold workbook is enabled.
    #[must_use]
    pub fn active_threshold(&self) -> Option<f64> {
        self.threshold.filter(|t| *t > 0.0)
    }
}
