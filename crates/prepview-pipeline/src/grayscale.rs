//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP), decodes them to a
//! 3-channel colour buffer, and reduces that to the single-channel
//! grayscale buffer every processing run starts from.

use image::{GrayImage, Luma, RgbImage};

use crate::types::PipelineError;

/// BT.601 luma weights in 14-bit fixed point: `0.299`, `0.587`, `0.114`.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const WEIGHT_SHIFT: u32 = 14;
const _: () = assert!(R_WEIGHT + G_WEIGHT + B_WEIGHT == 1 << WEIGHT_SHIFT);

/// Decode raw image bytes and convert to grayscale.
///
/// The image is first decoded to 8-bit RGB (alpha and higher bit
/// depths are dropped by the `image` crate), then reduced with
/// [`rgb_to_grayscale`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::InvalidInput(
            "input image data is empty".to_string(),
        ));
    }

    let img = image::load_from_memory(bytes)?;
    Ok(rgb_to_grayscale(&img.to_rgb8()))
}

/// Reduce an RGB buffer to grayscale with the BT.601 luma formula
/// `0.299*R + 0.587*G + 0.114*B`, rounded to nearest.
///
/// The weights sum to exactly one in fixed point, so neutral pixels
/// (`R == G == B`) keep their value.
#[must_use = "returns the grayscale image"]
pub fn rgb_to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let weighted =
            u32::from(r) * R_WEIGHT + u32::from(g) * G_WEIGHT + u32::from(b) * B_WEIGHT;
        let rounded = (weighted + (1 << (WEIGHT_SHIFT - 1))) >> WEIGHT_SHIFT;
        // At most 255 * 2^14 + 2^13 before the shift.
        Luma([u8::try_from(rounded).unwrap_or(u8::MAX)])
    })
}
