//! Histogram equalization.
//!
//! Builds a lookup table from the cumulative distribution of the input
//! so that the darkest occupied level maps to 0, the brightest to 255,
//! and the levels in between are spread in proportion to how many
//! pixels sit below them.

use image::GrayImage;

use crate::histogram::{self, LEVELS};

/// Equalize the histogram of a grayscale image.
///
/// The mapping is
///
/// ```text
/// lut[v] = round((cdf(v) - count(v_min)) * 255 / (N - count(v_min)))
/// ```
///
/// where `v_min` is the darkest occupied level and `N` the pixel count.
/// Empty and single-valued images are returned unchanged, since there
/// is no spread to stretch.
#[must_use = "returns the equalized image"]
pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let lut = equalization_lut(&histogram::histogram(image));
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[usize::from(pixel.0[0])];
    }
    out
}

/// Compute the equalization lookup table for a histogram.
///
/// Returns the identity table when the histogram has fewer than two
/// occupied levels.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn equalization_lut(hist: &histogram::Histogram) -> [u8; LEVELS] {
    let identity: [u8; LEVELS] = std::array::from_fn(|level| level as u8);

    let Some(lowest) = hist.min_level() else {
        return identity;
    };
    let total = hist.total();
    let base = hist.count(lowest);
    if base == total {
        return identity;
    }

    let scale = 255.0 / (total - base) as f64;
    let cdf = hist.cumulative();
    // Levels below `lowest` have no pixels; they map to 0 like `lowest`.
    std::array::from_fn(|level| {
        let above_base = cdf[level].saturating_sub(base);
        (above_base as f64 * scale).round().min(255.0) as u8
    })
}
