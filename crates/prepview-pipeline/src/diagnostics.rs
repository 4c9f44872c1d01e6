//! Pipeline diagnostics: timing and per-stage metrics.
//!
//! [`process_with_diagnostics`] runs the same fixed-order chain as
//! [`crate::process`] while timing each applied stage and recording what
//! it did to the buffer. Stages that were not selected have `None`
//! entries.
//!
//! Time is read through the [`Clock`] trait so the core stays free of
//! platform timers; hosts supply an implementation backed by
//! `std::time::Instant` or similar.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blur::{BLUR_KERNEL_SIZE, BLUR_SIGMA};
use crate::edge::{CANNY_HIGH, CANNY_LOW};
use crate::histogram::histogram;
use crate::types::{Dimensions, FilterSelection, FilterStage, PipelineError, ProcessedResult};

/// Source of monotonic timestamps.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current point in time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Histogram equalization (only when selected).
    pub equalize: Option<StageDiagnostics>,
    /// Gaussian blur (only when selected).
    pub blur: Option<StageDiagnostics>,
    /// Edge detection (only when selected).
    pub edge_detection: Option<StageDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the run.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Histogram equalization metrics.
    Equalize {
        /// Occupied intensity levels before the stage.
        occupied_bins_before: usize,
        /// Occupied intensity levels after the stage.
        occupied_bins_after: usize,
        /// `(darkest, brightest)` level before the stage.
        range_before: (u8, u8),
        /// `(darkest, brightest)` level after the stage.
        range_after: (u8, u8),
    },
    /// Gaussian blur metrics.
    Blur {
        /// Kernel standard deviation.
        sigma: f32,
        /// Kernel side length.
        kernel_size: usize,
    },
    /// Edge detection metrics.
    EdgeDetection {
        /// Low hysteresis threshold.
        low_threshold: f32,
        /// High hysteresis threshold.
        high_threshold: f32,
        /// Number of edge pixels (value == 255) in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
}

/// High-level summary of a processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Stages applied, in order.
    pub applied: Vec<FilterStage>,
}

impl PipelineDiagnostics {
    /// Diagnostics for `stage`, if it ran.
    #[must_use]
    pub const fn stage(&self, stage: FilterStage) -> Option<&StageDiagnostics> {
        match stage {
            FilterStage::Equalize => self.equalize.as_ref(),
            FilterStage::Blur => self.blur.as_ref(),
            FilterStage::EdgeDetect => self.edge_detection.as_ref(),
        }
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        if self.summary.applied.is_empty() {
            lines.push("No filters selected (pass-through).".to_string());
            return lines.join("\n");
        }

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for stage in FilterStage::ORDER {
            let Some(diag) = self.stage(stage) else {
                continue;
            };
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{:<24} {ms:>8.3}ms {pct:>9.1}%  {details}", stage.name()));
        }

        lines.join("\n")
    }
}

/// Run the processing chain on `source`, collecting diagnostics.
///
/// Produces the same [`ProcessedResult`] as [`crate::process`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `source` is `None` or has
/// no pixels.
pub fn process_with_diagnostics<C: Clock>(
    source: Option<&GrayImage>,
    selection: &FilterSelection,
    clock: &C,
) -> Result<(ProcessedResult, PipelineDiagnostics), PipelineError> {
    let source = crate::validate_source(source)?;
    let dimensions = Dimensions::of(source);
    let run_start = clock.now();

    let mut diagnostics = PipelineDiagnostics {
        equalize: None,
        blur: None,
        edge_detection: None,
        total_duration: Duration::ZERO,
        summary: PipelineSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            applied: Vec::new(),
        },
    };

    let mut current = source.clone();
    for stage in selection.stages() {
        let start = clock.now();
        let next = stage.apply(&current);
        let duration = clock.elapsed(&start);
        debug!(stage = stage.name(), ?duration, "applied filter");

        let metrics = stage_metrics(stage, &current, &next);
        let entry = Some(StageDiagnostics { duration, metrics });
        match stage {
            FilterStage::Equalize => diagnostics.equalize = entry,
            FilterStage::Blur => diagnostics.blur = entry,
            FilterStage::EdgeDetect => diagnostics.edge_detection = entry,
        }
        diagnostics.summary.applied.push(stage);
        current = next;
    }

    diagnostics.total_duration = clock.elapsed(&run_start);
    let result = ProcessedResult {
        image: current,
        applied: diagnostics.summary.applied.clone(),
    };
    Ok((result, diagnostics))
}

/// Metrics describing what `stage` did between `before` and `after`.
fn stage_metrics(stage: FilterStage, before: &GrayImage, after: &GrayImage) -> StageMetrics {
    match stage {
        FilterStage::Equalize => {
            let hist_before = histogram(before);
            let hist_after = histogram(after);
            let range = |h: &crate::Histogram| {
                (h.min_level().unwrap_or(0), h.max_level().unwrap_or(0))
            };
            StageMetrics::Equalize {
                occupied_bins_before: hist_before.occupied_bins(),
                occupied_bins_after: hist_after.occupied_bins(),
                range_before: range(&hist_before),
                range_after: range(&hist_after),
            }
        }
        FilterStage::Blur => StageMetrics::Blur {
            sigma: BLUR_SIGMA,
            kernel_size: BLUR_KERNEL_SIZE,
        },
        FilterStage::EdgeDetect => StageMetrics::EdgeDetection {
            low_threshold: CANNY_LOW,
            high_threshold: CANNY_HIGH,
            edge_pixel_count: count_edge_pixels(after),
            total_pixel_count: Dimensions::of(after).pixel_count(),
        },
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Equalize {
            occupied_bins_before,
            occupied_bins_after,
            range_before,
            range_after,
        } => {
            format!(
                "levels {}..={} -> {}..={}, bins {occupied_bins_before}->{occupied_bins_after}",
                range_before.0, range_before.1, range_after.0, range_after.1,
            )
        }
        StageMetrics::Blur { sigma, kernel_size } => {
            format!("{kernel_size}x{kernel_size} sigma={sigma:.2}")
        }
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} \
                 edges={edge_pixel_count} ({density:.1}%)",
            )
        }
    }
}

/// Count edge pixels (value == 255) in a grayscale image.
pub(crate) fn count_edge_pixels(image: &GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use image::Luma;

    use super::*;

    /// Clock that advances one millisecond every time it is read.
    struct StepClock {
        ticks: Cell<u64>,
    }

    impl StepClock {
        const fn new() -> Self {
            Self {
                ticks: Cell::new(0),
            }
        }
    }

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _| if x < 10 { Luma([40]) } else { Luma([200]) })
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn count_edge_pixels_works() {
        let mut img = GrayImage::new(10, 10);
        for i in 0..5 {
            img.put_pixel(i, 0, Luma([255]));
        }
        assert_eq!(count_edge_pixels(&img), 5);
    }

    #[test]
    fn no_image_is_invalid_input() {
        let result = process_with_diagnostics(None, &FilterSelection::ALL, &StepClock::new());
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn matches_plain_process() {
        let img = sharp_edge_image();
        let (result, _) =
            process_with_diagnostics(Some(&img), &FilterSelection::ALL, &StepClock::new()).unwrap();
        let plain = crate::process(Some(&img), &FilterSelection::ALL).unwrap();
        assert_eq!(result, plain);
    }

    #[test]
    fn only_selected_stages_are_recorded() {
        let img = sharp_edge_image();
        let selection = FilterSelection {
            equalize: true,
            blur: false,
            edges: true,
        };
        let (_, diag) =
            process_with_diagnostics(Some(&img), &selection, &StepClock::new()).unwrap();
        assert!(diag.equalize.is_some());
        assert!(diag.blur.is_none());
        assert!(diag.edge_detection.is_some());
        assert_eq!(
            diag.summary.applied,
            vec![FilterStage::Equalize, FilterStage::EdgeDetect],
        );
        assert_eq!(diag.summary.pixel_count, 400);
    }

    #[test]
    fn equalize_metrics_report_range_stretch() {
        let img = sharp_edge_image();
        let selection = FilterSelection {
            equalize: true,
            ..FilterSelection::NONE
        };
        let (_, diag) =
            process_with_diagnostics(Some(&img), &selection, &StepClock::new()).unwrap();
        assert_eq!(
            diag.equalize.unwrap().metrics,
            StageMetrics::Equalize {
                occupied_bins_before: 2,
                occupied_bins_after: 2,
                range_before: (40, 200),
                range_after: (0, 255),
            },
        );
    }

    #[test]
    fn stage_durations_come_from_the_clock() {
        let img = sharp_edge_image();
        let (_, diag) =
            process_with_diagnostics(Some(&img), &FilterSelection::ALL, &StepClock::new()).unwrap();
        for stage in FilterStage::ORDER {
            assert_eq!(diag.stage(stage).unwrap().duration, Duration::from_millis(1));
        }
        assert!(diag.total_duration >= Duration::from_millis(3));
    }

    #[test]
    fn report_lists_applied_stages() {
        let img = sharp_edge_image();
        let (_, diag) =
            process_with_diagnostics(Some(&img), &FilterSelection::ALL, &StepClock::new()).unwrap();
        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        assert!(report.contains("Histogram Equalization"));
        assert!(report.contains("9x9 sigma=2.00"));
        assert!(report.contains("low=50.0 high=150.0"));
    }

    #[test]
    fn report_for_pass_through() {
        let img = sharp_edge_image();
        let (_, diag) =
            process_with_diagnostics(Some(&img), &FilterSelection::NONE, &StepClock::new())
                .unwrap();
        assert!(diag.report().contains("pass-through"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let img = sharp_edge_image();
        let (_, diag) =
            process_with_diagnostics(Some(&img), &FilterSelection::ALL, &StepClock::new()).unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        assert!((json["blur"]["duration"].as_f64().unwrap() - 0.001).abs() < 1e-12);
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.summary.applied, FilterStage::ORDER.to_vec());
    }
}
