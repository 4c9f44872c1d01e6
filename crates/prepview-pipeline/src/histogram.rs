//! 256-bin intensity histograms.
//!
//! [`histogram`] counts every intensity level of a grayscale buffer.
//! The resulting [`Histogram`] is plain data: hosts chart it, the
//! equalization stage derives its lookup table from it, and the
//! diagnostics report how a stage reshaped it.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Number of intensity levels in an 8-bit buffer.
pub const LEVELS: usize = 256;

/// Per-level pixel counts of a grayscale buffer.
///
/// Serialized as a flat JSON array of exactly [`LEVELS`] counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram([u64; LEVELS]);

impl Histogram {
    /// Wrap a precomputed set of counts.
    #[must_use]
    pub const fn from_counts(counts: [u64; LEVELS]) -> Self {
        Self(counts)
    }

    /// All 256 counts, indexed by intensity level.
    #[must_use]
    pub const fn counts(&self) -> &[u64; LEVELS] {
        &self.0
    }

    /// Number of pixels with intensity `level`.
    #[must_use]
    pub const fn count(&self, level: u8) -> u64 {
        self.0[level as usize]
    }

    /// Total pixel count (sum of all bins).
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Largest single bin count. Zero for an empty histogram.
    #[must_use]
    pub fn peak(&self) -> u64 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Darkest level present, or `None` if no pixels were counted.
    #[must_use]
    pub fn min_level(&self) -> Option<u8> {
        self.0
            .iter()
            .position(|&count| count > 0)
            .and_then(|level| u8::try_from(level).ok())
    }

    /// Brightest level present, or `None` if no pixels were counted.
    #[must_use]
    pub fn max_level(&self) -> Option<u8> {
        self.0
            .iter()
            .rposition(|&count| count > 0)
            .and_then(|level| u8::try_from(level).ok())
    }

    /// Number of levels with at least one pixel.
    #[must_use]
    pub fn occupied_bins(&self) -> usize {
        self.0.iter().filter(|&&count| count > 0).count()
    }

    /// Running totals: entry `i` is the number of pixels at or below
    /// level `i`.
    #[must_use]
    pub fn cumulative(&self) -> [u64; LEVELS] {
        let mut cdf = [0; LEVELS];
        let mut sum = 0;
        for (slot, &count) in cdf.iter_mut().zip(&self.0) {
            sum += count;
            *slot = sum;
        }
        cdf
    }

    /// Shannon entropy of the intensity distribution, in bits.
    ///
    /// Zero for an empty or single-valued buffer, 8.0 for a perfectly
    /// flat one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        self.0
            .iter()
            .filter(|&&count| count > 0)
            .map(|&count| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self([0; LEVELS])
    }
}

impl Serialize for Histogram {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for Histogram {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let counts = Vec::<u64>::deserialize(deserializer)?;
        let len = counts.len();
        let counts: [u64; LEVELS] = counts.try_into().map_err(|_| {
            serde::de::Error::custom(format!("histogram must have {LEVELS} bins, got {len}"))
        })?;
        Ok(Self(counts))
    }
}

/// Count the occurrences of each intensity level in `image`.
///
/// The counts always sum to `width * height`.
#[must_use = "returns the histogram"]
pub fn histogram(image: &GrayImage) -> Histogram {
    let mut counts = [0; LEVELS];
    for pixel in image.pixels() {
        counts[usize::from(pixel.0[0])] += 1;
    }
    Histogram(counts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;
    use image::Luma;

    use super::*;

    #[test]
    fn uniform_buffer_has_single_bin() {
        let img = GrayImage::from_pixel(4, 4, Luma([100]));
        let hist = histogram(&img);
        assert_eq!(hist.count(100), 16);
        assert_eq!(hist.occupied_bins(), 1);
        assert_eq!(hist.total(), 16);
        assert_eq!(hist.min_level(), Some(100));
        assert_eq!(hist.max_level(), Some(100));
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn counts_sum_to_pixel_count() {
        for (w, h) in [(1, 1), (3, 5), (17, 31), (64, 2)] {
            let img = GrayImage::from_fn(w, h, |x, y| Luma([((x * 37 + y * 11) % 256) as u8]));
            let hist = histogram(&img);
            assert_eq!(hist.total(), u64::from(w) * u64::from(h), "for {w}x{h}");
        }
    }

    #[test]
    fn empty_buffer_has_empty_histogram() {
        let hist = histogram(&GrayImage::new(0, 0));
        assert_eq!(hist, Histogram::default());
        assert_eq!(hist.total(), 0);
        assert_eq!(hist.peak(), 0);
        assert_eq!(hist.min_level(), None);
        assert_eq!(hist.max_level(), None);
        assert_relative_eq!(hist.entropy(), 0.0);
    }

    #[test]
    fn extreme_levels_are_counted() {
        let img = GrayImage::from_fn(2, 1, |x, _| if x == 0 { Luma([0]) } else { Luma([255]) });
        let hist = histogram(&img);
        assert_eq!(hist.count(0), 1);
        assert_eq!(hist.count(255), 1);
        assert_eq!(hist.min_level(), Some(0));
        assert_eq!(hist.max_level(), Some(255));
    }

    #[test]
    fn cumulative_ends_at_total() {
        let img = GrayImage::from_fn(8, 8, |x, _| Luma([u8::try_from(x * 10).unwrap()]));
        let hist = histogram(&img);
        let cdf = hist.cumulative();
        assert_eq!(cdf[0], 8);
        assert_eq!(cdf[9], 8);
        assert_eq!(cdf[10], 16);
        assert_eq!(cdf[LEVELS - 1], 64);
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn entropy_of_flat_distribution_is_eight_bits() {
        let hist = Histogram::from_counts([3; LEVELS]);
        assert_relative_eq!(hist.entropy(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn entropy_of_two_equal_bins_is_one_bit() {
        let mut counts = [0; LEVELS];
        counts[10] = 50;
        counts[200] = 50;
        assert_relative_eq!(Histogram::from_counts(counts).entropy(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn peak_is_largest_bin() {
        let mut counts = [1; LEVELS];
        counts[42] = 99;
        assert_eq!(Histogram::from_counts(counts).peak(), 99);
    }

    #[test]
    fn serializes_as_flat_array() {
        let mut counts = [0; LEVELS];
        counts[1] = 7;
        let json = serde_json::to_value(Histogram::from_counts(counts)).unwrap();
        let array = json.as_array().unwrap();
        assert_eq!(array.len(), LEVELS);
        assert_eq!(array[1], 7);
    }

    #[test]
    fn deserialize_rejects_wrong_length() {
        let result: Result<Histogram, _> = serde_json::from_str("[1, 2, 3]");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("256 bins, got 3"), "unexpected error: {err}");
    }
}
