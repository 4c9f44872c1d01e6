//! Histogram bar charts rendered with `tiny-skia`.
//!
//! One bar per intensity level, scaled so the tallest bin reaches the
//! top of the plot area. The result is a straight-alpha [`RgbaImage`]
//! that can be written with the `image` encoders.

use std::path::Path;

use image::{Rgba, RgbaImage};
use prepview_pipeline::Histogram;
use prepview_pipeline::histogram::LEVELS;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Default chart width: two pixels per intensity level plus margins.
#[allow(clippy::cast_possible_truncation)]
pub const DEFAULT_WIDTH: u32 = 2 * LEVELS as u32 + 2 * MARGIN;

/// Default chart height.
pub const DEFAULT_HEIGHT: u32 = 240;

/// Blank border around the plot area, in pixels.
const MARGIN: u32 = 16;

/// Errors from rendering or saving a chart.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// The requested canvas leaves no room for a plot.
    #[error("chart canvas {width}x{height} is too small")]
    CanvasTooSmall {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Encoding or writing the chart failed.
    #[error("failed to write chart: {0}")]
    Write(#[from] image::ImageError),
}

/// Bar colour of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarColor(pub [u8; 3]);

impl BarColor {
    /// Colour for the original image's histogram.
    pub const ORIGINAL: Self = Self([31, 119, 180]);
    /// Colour for the processed image's histogram.
    pub const PROCESSED: Self = Self([255, 127, 14]);
}

/// Render `hist` as a bar chart of `width` x `height` pixels.
///
/// # Errors
///
/// Returns [`ChartError::CanvasTooSmall`] if the canvas cannot hold the
/// margins plus a one-pixel plot area.
#[allow(clippy::cast_precision_loss)]
pub fn render_histogram(
    hist: &Histogram,
    width: u32,
    height: u32,
    color: BarColor,
) -> Result<RgbaImage, ChartError> {
    let too_small = ChartError::CanvasTooSmall { width, height };
    if width <= 2 * MARGIN || height <= 2 * MARGIN {
        return Err(too_small);
    }
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return Err(too_small);
    };
    pixmap.fill(Color::WHITE);

    let left = MARGIN as f32;
    let bottom = (height - MARGIN) as f32;
    let plot_w = (width - 2 * MARGIN) as f32;
    let plot_h = (height - 2 * MARGIN) as f32;
    let bar_w = plot_w / LEVELS as f32;

    // Bars.
    let peak = hist.peak();
    if peak > 0 {
        let mut pb = PathBuilder::new();
        for (level, &count) in hist.counts().iter().enumerate() {
            let bar_h = count as f32 / peak as f32 * plot_h;
            let x = left + level as f32 * bar_w;
            if let Some(rect) = Rect::from_xywh(x, bottom - bar_h, bar_w, bar_h) {
                pb.push_rect(rect);
            }
        }
        if let Some(path) = pb.finish() {
            let [r, g, b] = color.0;
            let mut paint = Paint::default();
            paint.set_color_rgba8(r, g, b, 255);
            paint.anti_alias = false;
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    // Axes: baseline and left edge.
    let mut pb = PathBuilder::new();
    pb.move_to(left, MARGIN as f32);
    pb.line_to(left, bottom);
    pb.line_to(left + plot_w, bottom);
    if let Some(axes) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&axes, &paint, &stroke, Transform::identity(), None);
    }

    Ok(to_rgba_image(&pixmap))
}

/// Render `hist` at the default size and save it to `path`.
///
/// The format follows the file extension.
///
/// # Errors
///
/// Returns [`ChartError::Write`] if encoding or writing fails.
pub fn save_histogram_chart(
    hist: &Histogram,
    color: BarColor,
    path: &Path,
) -> Result<(), ChartError> {
    let chart = render_histogram(hist, DEFAULT_WIDTH, DEFAULT_HEIGHT, color)?;
    chart.save(path)?;
    Ok(())
}

/// Convert a premultiplied pixmap into a straight-alpha image.
fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn single_bin(level: u8, count: u64) -> Histogram {
        let mut counts = [0; LEVELS];
        counts[usize::from(level)] = count;
        Histogram::from_counts(counts)
    }

    fn is_bar(px: &Rgba<u8>, color: BarColor) -> bool {
        px.0[..3] == color.0
    }

    #[test]
    fn default_size_gives_two_pixels_per_level() {
        assert_eq!(DEFAULT_WIDTH, 544);
    }

    #[test]
    fn chart_has_requested_size_and_opaque_background() {
        let chart =
            render_histogram(&single_bin(10, 5), DEFAULT_WIDTH, DEFAULT_HEIGHT, BarColor::ORIGINAL)
                .unwrap();
        assert_eq!(chart.dimensions(), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(chart.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
        assert!(chart.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn tallest_bin_reaches_top_of_plot() {
        let chart = render_histogram(
            &single_bin(100, 16),
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            BarColor::PROCESSED,
        )
        .unwrap();
        // Level 100 occupies columns MARGIN + 200 and MARGIN + 201.
        let x = MARGIN + 200;
        assert!(is_bar(chart.get_pixel(x, MARGIN + 1), BarColor::PROCESSED));
        assert!(is_bar(chart.get_pixel(x + 1, DEFAULT_HEIGHT / 2), BarColor::PROCESSED));
        // Neighbouring levels are empty.
        assert!(!is_bar(chart.get_pixel(x - 4, DEFAULT_HEIGHT / 2), BarColor::PROCESSED));
        assert!(!is_bar(chart.get_pixel(x + 4, DEFAULT_HEIGHT / 2), BarColor::PROCESSED));
    }

    #[test]
    fn bars_scale_relative_to_peak() {
        let mut counts = [0; LEVELS];
        counts[0] = 100;
        counts[200] = 50;
        let chart = render_histogram(
            &Histogram::from_counts(counts),
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            BarColor::ORIGINAL,
        )
        .unwrap();
        let half_bar_x = MARGIN + 400;
        let plot_top = MARGIN + 2;
        let lower_quarter = DEFAULT_HEIGHT - MARGIN - 20;
        assert!(!is_bar(chart.get_pixel(half_bar_x, plot_top), BarColor::ORIGINAL));
        assert!(is_bar(chart.get_pixel(half_bar_x, lower_quarter), BarColor::ORIGINAL));
    }

    #[test]
    fn empty_histogram_renders_blank_plot() {
        let chart = render_histogram(
            &Histogram::default(),
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            BarColor::ORIGINAL,
        )
        .unwrap();
        assert!(!chart.pixels().any(|p| is_bar(p, BarColor::ORIGINAL)));
    }

    #[test]
    fn tiny_canvas_is_rejected() {
        let err = render_histogram(&Histogram::default(), 20, 200, BarColor::ORIGINAL).unwrap_err();
        assert!(matches!(err, ChartError::CanvasTooSmall { width: 20, height: 200 }));
    }
}
