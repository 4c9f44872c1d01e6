//! Shared types for the prepview preprocessing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can hold grayscale
/// buffers without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` for the colour buffer produced at load time.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of a grayscale buffer.
    #[must_use]
    pub fn of(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total number of pixels (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One filter of the preprocessing chain.
///
/// The engine never applies stages in caller order: it walks
/// [`FilterStage::ORDER`] and applies the ones that are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterStage {
    /// Histogram equalization over the full 0-255 range.
    Equalize,
    /// 9x9 Gaussian smoothing, sigma 2.0.
    Blur,
    /// Two-threshold Canny edge detection (binary output).
    EdgeDetect,
}

impl FilterStage {
    /// The fixed application order.
    pub const ORDER: [Self; 3] = [Self::Equalize, Self::Blur, Self::EdgeDetect];

    /// Human-readable stage name, as shown in captions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Equalize => "Histogram Equalization",
            Self::Blur => "Gaussian Blur",
            Self::EdgeDetect => "Canny Edge Detection",
        }
    }

    /// Apply this stage to `image`, returning a new buffer of the same size.
    #[must_use = "returns the filtered image"]
    pub fn apply(self, image: &GrayImage) -> GrayImage {
        match self {
            Self::Equalize => crate::equalize::equalize_histogram(image),
            Self::Blur => crate::blur::gaussian_blur(image),
            Self::EdgeDetect => crate::edge::detect_edges(image),
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which filters the user has switched on.
///
/// Missing fields deserialize as `false`, so `{"blur": true}` is a
/// valid selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    /// Apply histogram equalization.
    pub equalize: bool,
    /// Apply Gaussian blur.
    pub blur: bool,
    /// Apply Canny edge detection.
    pub edges: bool,
}

impl FilterSelection {
    /// No filters: processing passes the grayscale source through.
    pub const NONE: Self = Self {
        equalize: false,
        blur: false,
        edges: false,
    };

    /// Every filter.
    pub const ALL: Self = Self {
        equalize: true,
        blur: true,
        edges: true,
    };

    /// Whether `stage` is switched on.
    #[must_use]
    pub const fn contains(self, stage: FilterStage) -> bool {
        match stage {
            FilterStage::Equalize => self.equalize,
            FilterStage::Blur => self.blur,
            FilterStage::EdgeDetect => self.edges,
        }
    }

    /// Returns `true` if no filter is selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !(self.equalize || self.blur || self.edges)
    }

    /// Selected stages in application order.
    pub fn stages(self) -> impl Iterator<Item = FilterStage> {
        FilterStage::ORDER
            .into_iter()
            .filter(move |stage| self.contains(*stage))
    }
}

impl FromIterator<FilterStage> for FilterSelection {
    fn from_iter<I: IntoIterator<Item = FilterStage>>(iter: I) -> Self {
        let mut selection = Self::NONE;
        for stage in iter {
            match stage {
                FilterStage::Equalize => selection.equalize = true,
                FilterStage::Blur => selection.blur = true,
                FilterStage::EdgeDetect => selection.edges = true,
            }
        }
        selection
    }
}

/// Output of one processing run.
///
/// Does not derive serde traits: `GrayImage` has none, and hosts only
/// ever serialize the derived [`Comparison`](crate::session::Comparison).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResult {
    /// The buffer after every selected stage. A binary edge mask when
    /// edge detection ran.
    pub image: GrayImage,
    /// Stages that were applied, in application order. Empty for a
    /// pass-through run.
    pub applied: Vec<FilterStage>,
}

impl ProcessedResult {
    /// Dimensions of the processed buffer.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.image)
    }

    /// Names of the applied stages, in order.
    #[must_use]
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.applied.iter().map(|stage| stage.name()).collect()
    }

    /// Caption for the processed image panel, e.g.
    /// `"Processed Image with Histogram Equalization, Gaussian Blur"`.
    #[must_use]
    pub fn caption(&self) -> String {
        if self.applied.is_empty() {
            "Processed Image".to_string()
        } else {
            format!("Processed Image with {}", self.filter_names().join(", "))
        }
    }
}

/// Errors that can occur while loading, processing, or comparing images.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No image is loaded, or the buffer or byte slice is empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The two buffers being compared have different shapes.
    #[error("dimension mismatch: original is {original}, processed is {processed}")]
    DimensionMismatch {
        /// Dimensions of the original buffer.
        original: Dimensions,
        /// Dimensions of the processed buffer.
        processed: Dimensions,
    },

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}
