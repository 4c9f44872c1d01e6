//! prepview: preview grayscale preprocessing filters on an image.
//!
//! Loads an image, converts it to grayscale, applies any combination of
//! histogram equalization, Gaussian blur and Canny edge detection (always
//! in that order), and reports how the result compares with the
//! grayscale original:
//!
//! - caption naming the applied filters
//! - MSE and PSNR of processed against original
//! - optional histogram bar charts for both buffers
//! - optional per-stage timing diagnostics
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin prepview -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod chart;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use prepview_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use prepview_pipeline::{Comparison, FilterSelection, PipelineError, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::chart::{BarColor, ChartError};

/// File name of the original histogram chart inside `--histogram-dir`.
const ORIGINAL_CHART: &str = "hist_original.png";

/// File name of the processed histogram chart inside `--histogram-dir`.
const PROCESSED_CHART: &str = "hist_processed.png";

/// Preview grayscale preprocessing filters with histograms and quality
/// metrics.
///
/// With no filter flags the processed image is the grayscale original.
#[derive(Parser)]
#[command(name = "prepview", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Apply histogram equalization.
    #[arg(long)]
    equalize: bool,

    /// Apply a 9x9 Gaussian blur (sigma 2.0).
    #[arg(long)]
    blur: bool,

    /// Apply Canny edge detection (thresholds 50 / 150).
    #[arg(long)]
    edges: bool,

    /// Filter selection as a JSON string, e.g. `{"blur": true}`.
    ///
    /// Missing fields default to `false`.
    #[arg(long, conflicts_with_all = ["equalize", "blur", "edges"])]
    selection_json: Option<String>,

    /// Write the processed image to this path (format from extension).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write `hist_original.png` and `hist_processed.png` into this
    /// directory.
    #[arg(long)]
    histogram_dir: Option<PathBuf>,

    /// Print the comparison as JSON instead of a human-readable summary.
    #[arg(long)]
    json: bool,

    /// Collect and print per-stage timing diagnostics.
    #[arg(long)]
    diagnostics: bool,
}

/// Errors surfaced to the user by the command line.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error parsing --selection-json: {0}")]
    Selection(#[source] serde_json::Error),

    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("no processing result to compare")]
    NothingToCompare,

    #[error("error writing {}: {source}", path.display())]
    WriteImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("error creating {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing {}: {source}", path.display())]
    Chart {
        path: PathBuf,
        #[source]
        source: ChartError,
    },

    #[error("error serializing report: {0}")]
    Json(#[source] serde_json::Error),
}

/// Build a [`FilterSelection`] from CLI arguments.
///
/// If `--selection-json` is provided it is parsed directly and the
/// individual filter flags are ignored (clap rejects combining them).
fn selection_from_cli(cli: &Cli) -> Result<FilterSelection, CliError> {
    if let Some(ref json) = cli.selection_json {
        return serde_json::from_str(json).map_err(CliError::Selection);
    }

    Ok(FilterSelection {
        equalize: cli.equalize,
        blur: cli.blur,
        edges: cli.edges,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let selection = selection_from_cli(cli)?;

    let image_bytes = std::fs::read(&cli.image_path).map_err(|source| CliError::Read {
        path: cli.image_path.clone(),
        source,
    })?;
    info!(
        path = %cli.image_path.display(),
        bytes = image_bytes.len(),
        "read image",
    );

    let mut session = Session::new();
    session.load(&image_bytes)?;

    let diagnostics = if cli.diagnostics {
        session.process_with_diagnostics(&selection, &StdClock)
    } else {
        session.process(&selection);
        None
    };

    let comparison = session.comparison().ok_or(CliError::NothingToCompare)?;

    if let Some(ref path) = cli.output
        && let Some(result) = session.processed()
    {
        result.image.save(path).map_err(|source| CliError::WriteImage {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "processed image written");
    }

    if let Some(ref dir) = cli.histogram_dir {
        write_histogram_charts(&comparison, dir)?;
    }

    if cli.json {
        let report = serde_json::json!({
            "comparison": comparison,
            "diagnostics": diagnostics,
        });
        let json = serde_json::to_string_pretty(&report).map_err(CliError::Json)?;
        println!("{json}");
    } else {
        print_summary(&comparison, diagnostics.as_ref());
    }

    Ok(())
}

/// Save bar charts for both histograms into `dir`, creating it if needed.
fn write_histogram_charts(comparison: &Comparison, dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|source| CliError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let charts = [
        (ORIGINAL_CHART, &comparison.original_histogram, BarColor::ORIGINAL),
        (PROCESSED_CHART, &comparison.processed_histogram, BarColor::PROCESSED),
    ];
    for (name, hist, color) in charts {
        let path = dir.join(name);
        chart::save_histogram_chart(hist, color, &path)
            .map_err(|source| CliError::Chart {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "histogram chart written");
    }
    Ok(())
}

/// Print the human-readable comparison, plus the diagnostics table when
/// it was collected.
fn print_summary(comparison: &Comparison, diagnostics: Option<&PipelineDiagnostics>) {
    println!("{}", comparison.caption);
    println!("Size: {}", comparison.dimensions);
    println!("{}", comparison.quality);

    let original = &comparison.original_histogram;
    let processed = &comparison.processed_histogram;
    println!(
        "Original:  {} levels, entropy {:.3} bits",
        original.occupied_bins(),
        original.entropy(),
    );
    println!(
        "Processed: {} levels, entropy {:.3} bits",
        processed.occupied_bins(),
        processed.entropy(),
    );

    if let Some(diagnostics) = diagnostics {
        println!();
        println!("{}", diagnostics.report());
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
