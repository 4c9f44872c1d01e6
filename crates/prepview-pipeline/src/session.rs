//! Loaded-image state for an interactive host.
//!
//! A [`Session`] owns the most recently loaded grayscale buffer and the
//! last processing result. Loading replaces both wholesale; processing
//! only ever reads the loaded buffer.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diagnostics::{Clock, PipelineDiagnostics, process_with_diagnostics};
use crate::grayscale::decode_and_grayscale;
use crate::histogram::{Histogram, histogram};
use crate::quality::{QualityMetric, quality_metrics};
use crate::types::{Dimensions, FilterSelection, FilterStage, PipelineError, ProcessedResult};
use crate::GrayImage;

/// Everything a host shows after a processing run: the caption, both
/// histograms and the quality metric pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Caption for the processed panel.
    pub caption: String,
    /// Stages applied, in order.
    pub applied: Vec<FilterStage>,
    /// Dimensions shared by both buffers.
    pub dimensions: Dimensions,
    /// Histogram of the grayscale original.
    pub original_histogram: Histogram,
    /// Histogram of the processed buffer.
    pub processed_histogram: Histogram,
    /// MSE and PSNR of processed against original.
    pub quality: QualityMetric,
}

impl Comparison {
    /// Compare `processed` against the `original` it was derived from.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DimensionMismatch`] if the shapes differ,
    /// or [`PipelineError::InvalidInput`] if both are empty.
    pub fn between(
        original: &GrayImage,
        processed: &ProcessedResult,
    ) -> Result<Self, PipelineError> {
        let quality = quality_metrics(original, &processed.image)?;
        Ok(Self {
            caption: processed.caption(),
            applied: processed.applied.clone(),
            dimensions: processed.dimensions(),
            original_histogram: histogram(original),
            processed_histogram: histogram(&processed.image),
            quality,
        })
    }
}

/// The loaded grayscale image and the latest result derived from it.
#[derive(Debug, Default)]
pub struct Session {
    grayscale: Option<GrayImage>,
    processed: Option<ProcessedResult>,
}

impl Session {
    /// An empty session with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, convert to grayscale, and make it the current image.
    ///
    /// Any previous processing result is discarded. On failure the
    /// session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if `bytes` is empty, or
    /// [`PipelineError::ImageDecode`] if it is not a supported image.
    pub fn load(&mut self, bytes: &[u8]) -> Result<Dimensions, PipelineError> {
        let gray = decode_and_grayscale(bytes)?;
        Ok(self.load_grayscale(gray))
    }

    /// Install an already-decoded grayscale buffer as the current image.
    pub fn load_grayscale(&mut self, image: GrayImage) -> Dimensions {
        let dimensions = Dimensions::of(&image);
        info!(%dimensions, "loaded image");
        self.grayscale = Some(image);
        self.processed = None;
        dimensions
    }

    /// The loaded grayscale image.
    #[must_use]
    pub const fn grayscale(&self) -> Option<&GrayImage> {
        self.grayscale.as_ref()
    }

    /// The latest processing result.
    #[must_use]
    pub const fn processed(&self) -> Option<&ProcessedResult> {
        self.processed.as_ref()
    }

    /// Run the selected filters over the loaded image.
    ///
    /// Returns `None` and keeps the previous state if nothing usable is
    /// loaded.
    pub fn process(&mut self, selection: &FilterSelection) -> Option<&ProcessedResult> {
        match crate::process(self.grayscale.as_ref(), selection) {
            Ok(result) => {
                self.processed = Some(result);
                self.processed.as_ref()
            }
            Err(e) => {
                warn!(error = %e, "skipping processing");
                None
            }
        }
    }

    /// Like [`Session::process`], also returning per-stage diagnostics.
    pub fn process_with_diagnostics<C: Clock>(
        &mut self,
        selection: &FilterSelection,
        clock: &C,
    ) -> Option<PipelineDiagnostics> {
        match process_with_diagnostics(self.grayscale.as_ref(), selection, clock) {
            Ok((result, diagnostics)) => {
                self.processed = Some(result);
                Some(diagnostics)
            }
            Err(e) => {
                warn!(error = %e, "skipping processing");
                None
            }
        }
    }

    /// Comparison of the latest result against the loaded image.
    ///
    /// `None` until a processing run has completed.
    #[must_use]
    pub fn comparison(&self) -> Option<Comparison> {
        let original = self.grayscale.as_ref()?;
        let processed = self.processed.as_ref()?;
        match Comparison::between(original, processed) {
            Ok(comparison) => Some(comparison),
            Err(e) => {
                warn!(error = %e, "cannot compare images");
                None
            }
        }
    }

    /// Histogram of the loaded image.
    #[must_use]
    pub fn original_histogram(&self) -> Option<Histogram> {
        self.grayscale.as_ref().map(histogram)
    }
}
