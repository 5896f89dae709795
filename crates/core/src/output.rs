//! Output file naming and saving.
//!
//! Output workbooks are named after the run's start time, e.g.
//! `2024March5_14h7min9s_ratios.xlsx`. A run's outputs are written all or
//! nothing: each book is saved to a `.partial` file first and the files are
//! only renamed into place once every book has been written.

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::OutputBooks;
use chrono::{DateTime, TimeZone};
use ratiobook_sheet::Book;
use std::fmt::Display;
use std::path::{Path, PathBuf};

pub const TRANSFORMED_SUFFIX: &str = "transformed_data";
pub const RATIOS_SUFFIX: &str = "ratios";
pub const SORTED_SUFFIX: &str = "sorted_ratios";
pub const THRESHOLD_SUFFIX: &str = "data_with_threshold";

/// `{year}{month name}{day}_{h}h{m}min{s}s`, without zero padding.
#[must_use]
pub fn timestamp_prefix<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%Y%B%-d_%-Hh%-Mmin%-Ss").to_string()
}

/// Destination paths of one run's output workbooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub transformed: PathBuf,
    pub ratios: PathBuf,
    pub sorted: PathBuf,
    pub threshold: Option<PathBuf>,
}

impl OutputPaths {
    /// Paths in `dir` named after `at`.
    #[must_use]
    pub fn timestamped<Tz: TimeZone>(dir: &Path, at: &DateTime<Tz>, with_threshold: bool) -> Self
    where
        Tz::Offset: Display,
    {
        let prefix = timestamp_prefix(at);
        let path = |suffix: &str| dir.join(format!("{prefix}_{suffix}.xlsx"));
        Self {
            transformed: path(TRANSFORMED_SUFFIX),
            ratios: path(RATIOS_SUFFIX),
            sorted: path(SORTED_SUFFIX),
            threshold: with_threshold.then(|| path(THRESHOLD_SUFFIX)),
        }
    }

    /// Every destination path in write order.
    #[must_use]
    pub fn all(&self) -> Vec<&Path> {
        let mut paths = vec![
            self.transformed.as_path(),
            self.ratios.as_path(),
            self.sorted.as_path(),
        ];
        paths.extend(self.threshold.as_deref());
        paths
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("could not remove {}: {}", path.display(), e);
        }
    }
}

impl OutputBooks {
    fn pairs<'a>(&'a self, paths: &'a OutputPaths) -> PipelineResult<Vec<(&'a Book, &'a Path)>> {
        let mut pairs = vec![
            (&self.transformed, paths.transformed.as_path()),
            (&self.ratios, paths.ratios.as_path()),
            (&self.sorted, paths.sorted.as_path()),
        ];
        match (&self.threshold, &paths.threshold) {
            (Some(book), Some(path)) => pairs.push((book, path.as_path())),
            (None, None) => {}
            (Some(_), None) => {
                return Err(PipelineError::Config(
                    "no output path for the threshold workbook".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(PipelineError::Config(
                    "threshold workbook path given but the threshold filter is off".to_string(),
                ))
            }
        }
        Ok(pairs)
    }

    /// Save every book to its path. On failure no destination file of
    /// this run is left behind: leftover `.partial` files are removed and
    /// books already renamed into place are deleted again.
    ///
    /// # Errors
    ///
    /// Returns the first save or rename failure.
    pub fn save_all(&self, paths: &OutputPaths) -> PipelineResult<Vec<PathBuf>> {
        let pairs = self.pairs(paths)?;

        let mut written = Vec::with_capacity(pairs.len());
        for (book, path) in &pairs {
            let partial = partial_path(path);
            tracing::debug!("writing {} sheets to {}", book.sheet_count(), partial.display());
            if let Err(e) = book.save_as_xlsx(&partial) {
                written.push(partial);
                remove_files(&written);
                return Err(e.into());
            }
            written.push(partial);
        }

        let mut saved = Vec::with_capacity(pairs.len());
        for (i, (_, path)) in pairs.iter().enumerate() {
            if let Err(e) = std::fs::rename(&written[i], path) {
                remove_files(&written[i..]);
                remove_files(&saved);
                return Err(e.into());
            }
            tracing::info!("saved {}", path.display());
            saved.push(path.to_path_buf());
        }
        Ok(saved)
    }
}
