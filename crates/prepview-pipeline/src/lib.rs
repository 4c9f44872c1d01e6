//! prepview-pipeline: Grayscale image preprocessing (sans-IO).
//!
//! Applies a user-selected subset of three filters to an 8-bit
//! grayscale buffer, always in the same order:
//! histogram equalization -> Gaussian blur -> Canny edge detection.
//!
//! Alongside the engine the crate provides the analysis needed to
//! compare the result with its source: intensity histograms and
//! MSE / PSNR quality metrics.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and buffers and returns structured data. File access,
//! chart rendering, and the command line live in `prepview`.

pub mod blur;
mod canny;
pub mod diagnostics;
pub mod edge;
pub mod equalize;
pub mod grayscale;
pub mod histogram;
pub mod quality;
pub mod session;
pub mod types;

use tracing::debug;

pub use diagnostics::{Clock, PipelineDiagnostics, process_with_diagnostics};
pub use histogram::{Histogram, histogram};
pub use quality::{QualityMetric, quality_metrics};
pub use session::{Comparison, Session};
pub use types::{
    Dimensions, FilterSelection, FilterStage, GrayImage, PipelineError, ProcessedResult,
};

/// Run the selected filters over `source`.
///
/// The source is never modified; a copy flows through the stages in
/// [`FilterStage::ORDER`], each stage consuming the previous stage's
/// output. With no filters selected the result is a pixel-identical
/// copy of the source with an empty `applied` list.
///
/// # Pipeline steps
///
/// 1. Histogram equalization (if `selection.equalize`)
/// 2. Gaussian blur, 9x9 with sigma 2.0 (if `selection.blur`)
/// 3. Canny edge detection, thresholds 50 / 150 (if `selection.edges`)
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `source` is `None` or has
/// no pixels.
pub fn process(
    source: Option<&GrayImage>,
    selection: &FilterSelection,
) -> Result<ProcessedResult, PipelineError> {
    let source = validate_source(source)?;

    let mut applied = Vec::new();
    let image = selection.stages().fold(source.clone(), |current, stage| {
        debug!(stage = stage.name(), "applying filter");
        applied.push(stage);
        stage.apply(&current)
    });

    Ok(ProcessedResult { image, applied })
}

/// Convenience wrapper around [`process`] for a source that is known to
/// be present.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `source` has no pixels.
pub fn process_image(
    source: &GrayImage,
    selection: &FilterSelection,
) -> Result<ProcessedResult, PipelineError> {
    process(Some(source), selection)
}

/// Reject a missing or zero-area source buffer.
pub(crate) fn validate_source(source: Option<&GrayImage>) -> Result<&GrayImage, PipelineError> {
    let source = source.ok_or_else(|| PipelineError::InvalidInput("no image loaded".to_string()))?;
    let dimensions = Dimensions::of(source);
    if dimensions.is_empty() {
        return Err(PipelineError::InvalidInput(format!(
            "image has no pixels ({dimensions})"
        )));
    }
    Ok(source)
}
