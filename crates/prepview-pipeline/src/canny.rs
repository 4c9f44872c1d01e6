//! Canny edge detection without the built-in pre-blur.
//!
//! Derived from `imageproc::edges::{canny, non_maximum_suppression,
//! hysteresis}` with these changes:
//!
//! 1. **No internal Gaussian blur.** `imageproc` always smooths with
//!    sigma 1.4 first. Here smoothing is a separately selectable stage,
//!    so the detector works on whatever buffer it is given.
//! 2. **L1 gradient magnitude** (`|gx| + |gy|`) instead of `hypot`, the
//!    conventional norm for the 50/150 threshold pair.
//! 3. **Hysteresis visits all 8 neighbours** and bounds-checks them, so
//!    the search cannot wrap to `u32::MAX` at the image border
//!    (<https://github.com/image-rs/imageproc/issues/705>).
//! 4. **Safe pixel access** and an early return for images smaller
//!    than 3x3, where the interior loops would underflow.
//! 5. **Tie handling as in OpenCV.** Non-maximum suppression is strict
//!    against the left or upper neighbour, so a step edge thins to one
//!    pixel, and both hysteresis thresholds are exclusive.

use image::{GrayImage, Luma};
use imageproc::definitions::{HasBlack, HasWhite, Image};
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Run Canny edge detection on `image`.
///
/// Returns a binary image: 255 for edge pixels, 0 otherwise. Callers
/// must pass `low_threshold <= high_threshold`; see
/// [`crate::edge::canny`] for the clamping wrapper.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    debug_assert!(high_threshold >= low_threshold);
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return GrayImage::new(width, height);
    }

    // 1. Intensity of gradients.
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let g: Image<Luma<f32>> = Image::from_fn(width, height, |x, y| {
        let h = gx.get_pixel(x, y).0[0].unsigned_abs();
        let v = gy.get_pixel(x, y).0[0].unsigned_abs();
        Luma([f32::from(h) + f32::from(v)])
    });

    // 2. Non-maximum suppression (make edges thinner).
    let thinned = non_maximum_suppression(&g, &gx, &gy);

    // 3. Hysteresis to filter out edges based on thresholds.
    hysteresis(&thinned, low_threshold, high_threshold)
}

/// Finds local maxima along the gradient direction to make the edges
/// thinner. Border pixels are always suppressed.
fn non_maximum_suppression(
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    const RADIANS_TO_DEGREES: f32 = 180f32 / std::f32::consts::PI;
    let mut out = Image::from_pixel(g.width(), g.height(), Luma([0.0]));
    for y in 1..g.height() - 1 {
        for x in 1..g.width() - 1 {
            let x_gradient = f32::from(gx.get_pixel(x, y).0[0]);
            let y_gradient = f32::from(gy.get_pixel(x, y).0[0]);
            let mut angle = y_gradient.atan2(x_gradient) * RADIANS_TO_DEGREES;
            if angle < 0.0 {
                angle += 180.0;
            }

            // Get the two neighbors along the quantized gradient direction.
            // On a plateau only the left or upper pixel survives; diagonal
            // directions need a strict maximum.
            let (before, after, strict_after) = if !(22.5..157.5).contains(&angle) {
                (g.get_pixel(x - 1, y), g.get_pixel(x + 1, y), false)
            } else if angle < 67.5 {
                (g.get_pixel(x + 1, y + 1), g.get_pixel(x - 1, y - 1), true)
            } else if angle < 112.5 {
                (g.get_pixel(x, y - 1), g.get_pixel(x, y + 1), false)
            } else {
                (g.get_pixel(x - 1, y + 1), g.get_pixel(x + 1, y - 1), true)
            };

            let m = g.get_pixel(x, y).0[0];
            let beats_after = if strict_after {
                m > after.0[0]
            } else {
                m >= after.0[0]
            };
            if m > before.0[0] && beats_after {
                out.put_pixel(x, y, Luma([m]));
            }
        }
    }
    out
}

/// Filter out edges with the thresholds. Both comparisons are strict.
/// Non-recursive depth-first search over all 8 neighbours.
fn hysteresis(input: &Image<Luma<f32>>, low_thresh: f32, high_thresh: f32) -> GrayImage {
    let max_brightness = Luma::white();
    let min_brightness = Luma::black();
    let (w, h) = input.dimensions();
    // Init output image as all black.
    let mut out = Image::from_pixel(w, h, min_brightness);
    let mut edges = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let inp_pix = input.get_pixel(x, y).0[0];
            let out_pix = out.get_pixel(x, y).0[0];
            // If the edge strength is higher than high_thresh, mark it as an edge.
            if inp_pix > high_thresh && out_pix == 0 {
                out.put_pixel(x, y, max_brightness);
                edges.push((x, y));
                // Track neighbors until no neighbor is above low_thresh.
                while let Some((nx, ny)) = edges.pop() {
                    let neighbor_indices = [
                        (nx + 1, ny),
                        (nx + 1, ny + 1),
                        (nx, ny + 1),
                        (nx.wrapping_sub(1), ny.wrapping_sub(1)),
                        (nx.wrapping_sub(1), ny),
                        (nx.wrapping_sub(1), ny + 1),
                        (nx, ny.wrapping_sub(1)),
                        (nx + 1, ny.wrapping_sub(1)),
                    ];

                    for &(ix, iy) in &neighbor_indices {
                        // Wrapped coordinates land at u32::MAX and fail here.
                        if ix >= w || iy >= h {
                            continue;
                        }
                        let in_neighbor = input.get_pixel(ix, iy).0[0];
                        let out_neighbor = out.get_pixel(ix, iy).0[0];
                        if in_neighbor > low_thresh && out_neighbor == 0 {
                            out.put_pixel(ix, iy, max_brightness);
                            edges.push((ix, iy));
                        }
                    }
                }
            }
        }
    }
    out
}
