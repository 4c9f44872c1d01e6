//! Two-threshold edge detection.
//!
//! Wraps [`crate::canny::canny`] with the fixed thresholds used by the
//! edge detection stage and guards against degenerate threshold pairs.
//! The result is a binary mask: 255 for edge pixels, 0 for background.

use image::GrayImage;

/// Low hysteresis threshold of the edge detection stage.
pub const CANNY_LOW: f32 = 50.0;

/// High hysteresis threshold of the edge detection stage.
pub const CANNY_HIGH: f32 = 150.0;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero lets every pixel with any gradient join an
/// edge, which floods the mask.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);
const _: () = assert!(CANNY_LOW >= MIN_THRESHOLD && CANNY_LOW <= CANNY_HIGH);

/// Detect edges with the stage thresholds ([`CANNY_LOW`], [`CANNY_HIGH`]).
#[must_use = "returns the binary edge map"]
pub fn detect_edges(image: &GrayImage) -> GrayImage {
    canny(image, CANNY_LOW, CANNY_HIGH)
}

/// Detect edges using the Canny algorithm.
///
/// Pixels with gradient magnitude above `high_threshold` are definite
/// edges; those above `low_threshold` are edges only if connected to a
/// definite edge.
///
/// Both thresholds are clamped to a minimum of [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to be at most `high_threshold`.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (low, high) = clamp_thresholds(low_threshold, high_threshold);
    crate::canny::canny(image, low, high)
}

/// Apply the threshold invariants used by [`canny`].
#[must_use]
pub const fn clamp_thresholds(low_threshold: f32, high_threshold: f32) -> (f32, f32) {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    (low, high)
}

/// Returns `true` if every pixel is either 0 or 255.
#[must_use]
pub fn is_binary(image: &GrayImage) -> bool {
    image.pixels().all(|p| matches!(p.0[0], 0 | 255))
}
