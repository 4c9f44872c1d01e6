//! Gaussian blur.
//!
//! A fixed-size Gaussian applied with [`imageproc::filter::filter`]:
//! the 1-D kernel from [`gaussian_kernel`] is expanded to its square
//! outer product, accumulated in `f32`, and rounded back to `u8`. Pixels
//! outside the image are replaced by the nearest edge pixel.
//!
//! The kernel size is fixed rather than derived from sigma (as
//! [`imageproc::filter::gaussian_blur_f32`] does), so the smoothing stage
//! always covers the same 9x9 neighbourhood.

use image::GrayImage;
use imageproc::filter::filter;
use imageproc::kernel::Kernel;

/// Standard deviation of the smoothing kernel.
pub const BLUR_SIGMA: f32 = 2.0;

/// Side length of the square smoothing kernel.
pub const BLUR_KERNEL_SIZE: usize = 9;
const _: () = assert!(BLUR_KERNEL_SIZE % 2 == 1);

/// Smooth `image` with the 9x9, sigma 2.0 Gaussian.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage) -> GrayImage {
    gaussian_blur_with(image, BLUR_KERNEL_SIZE, BLUR_SIGMA)
}

/// Smooth `image` with a `size` x `size` Gaussian of standard deviation
/// `sigma`.
///
/// Even sizes are rounded up to the next odd size. Non-positive sigma
/// values and sizes below 3 return the image unchanged.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_with(image: &GrayImage, size: usize, sigma: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    if sigma <= 0.0 || size < 3 || w == 0 || h == 0 {
        return image.clone();
    }

    let taps = gaussian_kernel(size | 1, sigma);
    let Ok(side) = u32::try_from(taps.len()) else {
        return image.clone();
    };
    let weights: Vec<f32> = taps
        .iter()
        .flat_map(|&ky| taps.iter().map(move |&kx| ky * kx))
        .collect();

    filter(image, Kernel::new(&weights, side, side), to_u8)
}

/// Build a normalized 1-D Gaussian kernel of odd length `size`.
///
/// The weights sum to one, so a uniform image is left unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let radius = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;
    let raw: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
