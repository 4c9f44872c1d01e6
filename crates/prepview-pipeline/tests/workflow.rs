//! Integration test: load an encoded image, process it with each filter
//! combination, and compare the result against the grayscale original.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use prepview_pipeline::{Dimensions, FilterSelection, FilterStage, Session, edge, histogram};

/// A dim, low-contrast photo stand-in: a soft diagonal gradient with a
/// darker disc in the middle.
fn encoded_scene(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(48, 32, |x, y| {
        let dx = f64::from(x) - 24.0;
        let dy = f64::from(y) - 16.0;
        let base = 80 + (x + y) / 4;
        let v = if dx.hypot(dy) < 9.0 { base - 30 } else { base };
        let v = u8::try_from(v).unwrap();
        Rgb([v, v.saturating_add(10), v.saturating_sub(10)])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[test]
fn load_process_compare() {
    let mut session = Session::new();
    let dims = session.load(&encoded_scene(ImageFormat::Png)).expect("PNG should decode");
    assert_eq!(dims, Dimensions { width: 48, height: 32 });

    let original_hist = session.original_histogram().unwrap();
    assert_eq!(original_hist.total(), 48 * 32);

    let result = session.process(&FilterSelection::ALL).unwrap().clone();
    assert_eq!(
        result.applied,
        vec![FilterStage::Equalize, FilterStage::Blur, FilterStage::EdgeDetect],
    );
    assert!(edge::is_binary(&result.image));

    let comparison = session.comparison().unwrap();
    assert_eq!(comparison.dimensions, dims);
    assert_eq!(comparison.original_histogram, original_hist);
    assert_eq!(comparison.processed_histogram, histogram(&result.image));
    assert_eq!(comparison.processed_histogram.total(), 48 * 32);
    assert!(comparison.quality.mse > 0.0);
    assert!(comparison.quality.psnr.is_finite());
    eprintln!("{}: {}", comparison.caption, comparison.quality);
}

#[test]
fn equalization_widens_the_intensity_range() {
    let mut session = Session::new();
    session.load(&encoded_scene(ImageFormat::Bmp)).expect("BMP should decode");
    let selection = FilterSelection {
        equalize: true,
        ..FilterSelection::NONE
    };
    session.process(&selection).unwrap();
    let comparison = session.comparison().unwrap();

    let before = &comparison.original_histogram;
    let after = &comparison.processed_histogram;
    let spread = |h: &prepview_pipeline::Histogram| {
        h.max_level().unwrap() - h.min_level().unwrap()
    };
    assert!(spread(after) > spread(before));
    assert_eq!(after.min_level(), Some(0));
    assert_eq!(after.max_level(), Some(255));
    assert_eq!(comparison.caption, "Processed Image with Histogram Equalization");
}

#[test]
fn jpeg_source_is_processed() {
    let mut session = Session::new();
    let dims = session.load(&encoded_scene(ImageFormat::Jpeg)).expect("JPEG should decode");
    assert_eq!(dims, Dimensions { width: 48, height: 32 });

    let selection = FilterSelection {
        blur: true,
        edges: true,
        ..FilterSelection::NONE
    };
    let result = session.process(&selection).unwrap().clone();
    assert_eq!(result.applied, vec![FilterStage::Blur, FilterStage::EdgeDetect]);
    assert!(edge::is_binary(&result.image));

    let comparison = session.comparison().unwrap();
    assert_eq!(comparison.original_histogram.total(), 48 * 32);
    assert_eq!(comparison.caption, "Processed Image with Gaussian Blur, Canny Edge Detection");
}

#[test]
fn pass_through_is_lossless() {
    let mut session = Session::new();
    session.load(&encoded_scene(ImageFormat::Png)).unwrap();
    let result = session.process(&FilterSelection::NONE).unwrap().clone();
    assert_eq!(&result.image, session.grayscale().unwrap());

    let comparison = session.comparison().unwrap();
    assert!(comparison.quality.is_lossless());
    assert_eq!(comparison.original_histogram, comparison.processed_histogram);
}

#[test]
fn garbage_bytes_leave_session_empty() {
    let mut session = Session::new();
    assert!(session.load(b"\x89PNG\r\n\x1a\nbroken").is_err());
    assert!(session.grayscale().is_none());
    assert!(session.process(&FilterSelection::ALL).is_none());
}
