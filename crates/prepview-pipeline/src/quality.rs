//! Distortion metrics between an original and a processed buffer.
//!
//! Mean-squared error is accumulated in `u64` so that 8-bit differences
//! never overflow. PSNR uses the 8-bit peak of 255; identical buffers
//! have zero error and report an infinite PSNR rather than dividing by
//! zero.

use std::fmt;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError};

/// Peak intensity of an 8-bit sample.
pub const MAX_INTENSITY: f64 = 255.0;

/// Serde support for PSNR values that may be infinite.
///
/// JSON has no infinity, so the sentinel is written as `null` and read
/// back as `f64::INFINITY`.
mod psnr_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(psnr: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if psnr.is_finite() {
            Some(*psnr).serialize(serializer)
        } else {
            None::<f64>.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Mean-squared error and peak signal-to-noise ratio of a buffer pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetric {
    /// Average of the squared per-pixel differences.
    pub mse: f64,
    /// `20 * log10(255 / sqrt(mse))` in decibels; `f64::INFINITY` when
    /// `mse` is zero.
    #[serde(with = "psnr_serde")]
    pub psnr: f64,
}

impl QualityMetric {
    /// Build the metric pair from an MSE value.
    #[must_use]
    pub fn from_mse(mse: f64) -> Self {
        Self {
            mse,
            psnr: psnr_from_mse(mse),
        }
    }

    /// Returns `true` if the two buffers were pixel-identical.
    #[must_use]
    pub const fn is_lossless(&self) -> bool {
        self.psnr.is_infinite()
    }
}

impl fmt::Display for QualityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PSNR: {:.2} dB  MSE: {:.2}", self.psnr, self.mse)
    }
}

/// PSNR for a given MSE, with the infinite sentinel for zero error.
#[must_use]
pub fn psnr_from_mse(mse: f64) -> f64 {
    if mse > 0.0 {
        20.0 * (MAX_INTENSITY / mse.sqrt()).log10()
    } else {
        f64::INFINITY
    }
}

/// Mean-squared error between two buffers of the same shape.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the shapes differ.
/// Returns [`PipelineError::InvalidInput`] if both are empty.
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(
    original: &GrayImage,
    processed: &GrayImage,
) -> Result<f64, PipelineError> {
    let dims = check_same_shape(original, processed)?;
    let sum: u64 = original
        .pixels()
        .zip(processed.pixels())
        .map(|(a, b)| {
            let diff = u64::from(a.0[0].abs_diff(b.0[0]));
            diff * diff
        })
        .sum();
    Ok(sum as f64 / dims.pixel_count() as f64)
}

/// Compute MSE and PSNR between `original` and `processed`.
///
/// An edge mask is compared element-wise like any other buffer; the
/// number is crude for binary output but still well-defined.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the shapes differ.
/// Returns [`PipelineError::InvalidInput`] if both are empty.
pub fn quality_metrics(
    original: &GrayImage,
    processed: &GrayImage,
) -> Result<QualityMetric, PipelineError> {
    mean_squared_error(original, processed).map(QualityMetric::from_mse)
}

fn check_same_shape(
    original: &GrayImage,
    processed: &GrayImage,
) -> Result<Dimensions, PipelineError> {
    let original = Dimensions::of(original);
    let processed = Dimensions::of(processed);
    if original != processed {
        return Err(PipelineError::DimensionMismatch {
            original,
            processed,
        });
    }
    if original.is_empty() {
        return Err(PipelineError::InvalidInput(
            "cannot compare empty images".to_string(),
        ));
    }
    Ok(original)
}
