//! # ratiobook-cli
//!
//! Command-line interface for ratiobook.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use ratiobook_core::{
    process_workbook, BatchReport, CancelToken, OutputPaths, PipelineConfig, SheetErrorPolicy,
};
use ratiobook_sheet::Book;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// ratiobook - background-corrected ratios from Excel recordings
#[derive(Parser)]
#[command(name = "ratiobook")]
#[command(
    author,
    version,
    about = "Background correction, ratios and peak sorting for Excel recordings",
    long_about = None
)]
struct Cli {
    /// Excel (.xlsx) workbook to process
    #[arg(value_name = "FILE")]
    file_path: PathBuf,

    /// Configuration file (.json, .yaml or .yml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Response threshold; also writes a workbook with only the columns
    /// that exceed it (0 disables)
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of measurements kept per ratio column
    #[arg(long = "trimmed-output", value_name = "ROWS")]
    trimmed_output: Option<usize>,

    /// Add line charts of the first 12 columns to every ratio sheet
    #[arg(long)]
    add_chart: bool,

    /// First ratio-sheet row searched for the sorting peak
    #[arg(long)]
    start: Option<usize>,

    /// Ratio-sheet row at which the peak search stops (exclusive)
    #[arg(long)]
    stop: Option<usize>,

    /// Print the peak order of every sheet
    #[arg(long = "print-order", value_name = "BOOL")]
    print_order: Option<bool>,

    /// Directory the output workbooks are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Leave failing sheets out instead of aborting the run
    #[arg(long)]
    skip_failed_sheets: bool,

    /// Write the run report as JSON
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli)?;
    std::fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!("Failed to create output directory: {}", cli.output_dir.display())
    })?;

    println!("{} {}", "opened file:".cyan().bold(), cli.file_path.display());
    let paths = OutputPaths::timestamped(
        &cli.output_dir,
        &Local::now(),
        config.active_threshold().is_some(),
    );

    let cancel = CancelToken::new();
    let mut worker = {
        let cancel = cancel.clone();
        let config = config.clone();
        let source = cli.file_path.clone();
        let paths = paths.clone();
        tokio::task::spawn_blocking(move || run(&source, &config, &cancel, &paths))
    };

    let (report, saved) = tokio::select! {
        joined = &mut worker => joined.context("Worker thread failed")??,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{}", "interrupted, stopping...".yellow());
            cancel.cancel();
            worker.await.context("Worker thread failed")??
        }
    };

    if config.print_order {
        for sheet in &report.sheets {
            println!("{}", sheet.order_line());
        }
    }
    print_summary(&report, &saved);

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }

    Ok(())
}

/// Load defaults or the config file, then apply command-line overrides.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(threshold) = cli.threshold {
        config.threshold = Some(threshold);
    }
    if let Some(rows) = cli.trimmed_output {
        config.trim_limit = rows;
    }
    if let Some(start) = cli.start {
        config.window.start = start;
    }
    if let Some(stop) = cli.stop {
        config.window.stop = stop;
    }
    if let Some(print_order) = cli.print_order {
        config.print_order = print_order;
    }
    if cli.add_chart {
        config.add_chart = true;
    }
    if cli.skip_failed_sheets {
        config.on_sheet_error = SheetErrorPolicy::Skip;
    }

    config.validate()?;
    Ok(config)
}

/// Read, transform and save a workbook. Runs on a blocking thread.
fn run(
    source: &Path,
    config: &PipelineConfig,
    cancel: &CancelToken,
    paths: &OutputPaths,
) -> Result<(BatchReport, Vec<PathBuf>)> {
    let book = Book::from_xlsx(source)
        .with_context(|| format!("Failed to read workbook: {}", source.display()))?;
    tracing::info!("{} sheets in {}", book.sheet_count(), source.display());

    let batch = process_workbook(&book, config, cancel)?;
    cancel.check()?;

    let saved = batch.books.save_all(paths)?;
    Ok((batch.report, saved))
}

fn print_summary(report: &BatchReport, saved: &[PathBuf]) {
    println!(
        "{} {} sheet(s) processed",
        "done:".green().bold(),
        report.processed()
    );

    let non_finite: usize = report.sheets.iter().map(|s| s.non_finite_ratios).sum();
    if non_finite > 0 {
        println!(
            "{} {} ratio(s) divided by zero",
            "warning:".yellow().bold(),
            non_finite
        );
    }
    for sheet in report.sheets.iter().filter(|s| !s.marker_found) {
        println!(
            "{} no marker row in sheet '{}', analyzed from row 1",
            "warning:".yellow().bold(),
            sheet.name
        );
    }
    for skipped in &report.skipped {
        println!(
            "{} sheet '{}': {}",
            "skipped:".red().bold(),
            skipped.name,
            skipped.error
        );
    }
    for path in saved {
        println!("  {}", path.display());
    }
}
