//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! tolerance tuning and threshold experimentation. Call
//! [`process_staged_with_diagnostics`] to collect them alongside the
//! pipeline results.
//!
//! Duration measurements use [`std::time::Duration`]. Timestamps come
//! from a caller-supplied [`Clock`], which keeps this crate free of any
//! particular time source.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::source::PixelBuffer;
use crate::types::{PipelineConfig, PipelineError, StagedResult};

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

/// Source of timestamps for stage timing.
///
/// Native hosts wrap `std::time::Instant`; tests use a fake that
/// advances by a fixed step.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
///
/// Each field captures metrics for one logical stage of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: region quantization.
    pub quantize: StageDiagnostics,
    /// Stage 2: edge-node classification.
    pub layering: StageDiagnostics,
    /// Stage 3: boundary walking.
    pub scan: StageDiagnostics,
    /// Stage 4: internode interpolation.
    pub interpolation: StageDiagnostics,
    /// Stage 5: line and quadratic fitting.
    pub fit: StageDiagnostics,
    /// Stage 6: ordering and styling.
    pub compose: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
///
/// Each variant captures the counts and sizes meaningful for that
/// particular processing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Region quantization metrics.
    Quantize {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
        /// Threshold applied to the inverted first channel.
        threshold: u8,
        /// Pixels assigned to each region, indexed by region.
        region_pixel_counts: Vec<usize>,
    },
    /// Edge-node classification metrics.
    Layering {
        /// Number of layers (one per region).
        layer_count: usize,
        /// Nodes with a boundary code (1 to 14) in each layer.
        boundary_nodes: Vec<usize>,
    },
    /// Boundary walking metrics.
    PathScan {
        /// Number of paths kept across all regions.
        path_count: usize,
        /// Total number of corner points across all kept paths.
        total_point_count: usize,
        /// Minimum points in any single path.
        min_path_points: usize,
        /// Maximum points in any single path.
        max_path_points: usize,
        /// Mean points per path.
        mean_path_points: f64,
        /// Walks that enclosed a hole and were dropped.
        holes_discarded: usize,
        /// Walks shorter than `min_path_len` that were dropped.
        short_discarded: usize,
    },
    /// Internode interpolation metrics.
    Interpolation {
        /// Number of interpolated paths.
        path_count: usize,
        /// Total internodes across all paths.
        internode_count: usize,
    },
    /// Curve fitting metrics.
    CurveFit {
        /// Line tolerance (squared pixels).
        line_tolerance: f64,
        /// Quadratic tolerance (squared pixels).
        quad_tolerance: f64,
        /// Internodes fed into the fitter.
        internode_count: usize,
        /// Straight segments produced.
        line_count: usize,
        /// Quadratic segments produced.
        quad_count: usize,
        /// Fraction of internodes eliminated (0.0 = none, 1.0 = all).
        reduction_ratio: f64,
    },
    /// Composition metrics.
    Compose {
        /// Z-order strategy name.
        strategy: String,
        /// Non-empty and empty fitted paths offered for drawing.
        input_path_count: usize,
        /// Drawables in the output.
        drawable_count: usize,
        /// Paths that did not become drawables.
        dropped_count: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of fitted paths across all regions.
    pub path_count: usize,
    /// Segments across all fitted paths.
    pub segment_count: usize,
    /// Drawables in the final output.
    pub drawable_count: usize,
}

impl PipelineDiagnostics {
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

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let stages = [
            ("Quantize", &self.quantize),
            ("Layering", &self.layering),
            ("Path Scan", &self.scan),
            ("Interpolation", &self.interpolation),
            ("Curve Fit", &self.fit),
            ("Compose", &self.compose),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Paths: {}  |  Segments: {}  |  Drawables: {}",
            self.summary.path_count, self.summary.segment_count, self.summary.drawable_count,
        ));

        lines.join("\n")
    }
}

/// Run the full pipeline, timing every stage with `clock`.
///
/// Produces the same [`StagedResult`] as [`crate::process_staged`],
/// plus per-stage [`PipelineDiagnostics`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the config fails
/// validation, or [`PipelineError::CorruptTraceState`] if a boundary
/// walk fails.
pub fn process_staged_with_diagnostics<C: Clock>(
    pixels: &PixelBuffer,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let pipeline_start = clock.now();
    let start = clock.now();
    let quantized = Pipeline::quantize(pixels, config.clone())?;
    let quantize = timed(clock, &start, quantized.stage_metrics());

    let start = clock.now();
    let layered = quantized.build_layers();
    let layering = timed(clock, &start, layered.stage_metrics());

    let start = clock.now();
    let scanned = layered.scan()?;
    let scan = timed(clock, &start, scanned.stage_metrics());

    let start = clock.now();
    let interpolated = scanned.interpolate();
    let interpolation = timed(clock, &start, interpolated.stage_metrics());

    let start = clock.now();
    let fitted = interpolated.fit();
    let fit = timed(clock, &start, fitted.stage_metrics());

    let start = clock.now();
    let composed = fitted.compose();
    let compose = timed(clock, &start, composed.stage_metrics());

    let result = composed.into_result();
    let total_duration = clock.elapsed(&pipeline_start);

    let summary = PipelineSummary {
        image_width: result.dimensions.width,
        image_height: result.dimensions.height,
        pixel_count: u64::from(result.dimensions.width) * u64::from(result.dimensions.height),
        path_count: result.path_count(),
        segment_count: result.traced.iter().flatten().map(crate::TracedPath::len).sum(),
        drawable_count: result.drawables.len(),
    };

    let diagnostics = PipelineDiagnostics {
        quantize,
        layering,
        scan,
        interpolation,
        fit,
        compose,
        total_duration,
        summary,
    };
    Ok((result, diagnostics))
}

fn timed<C: Clock>(clock: &C, start: &C::Instant, metrics: StageMetrics) -> StageDiagnostics {
    StageDiagnostics {
        duration: clock.elapsed(start),
        metrics,
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Quantize {
            width,
            height,
            threshold,
            region_pixel_counts,
            ..
        } => {
            let counts: Vec<String> = region_pixel_counts.iter().map(usize::to_string).collect();
            format!(
                "{width}x{height} threshold={threshold} regions=[{}]",
                counts.join(", "),
            )
        }
        StageMetrics::Layering {
            layer_count,
            boundary_nodes,
        } => {
            let total: usize = boundary_nodes.iter().sum();
            format!("{layer_count} layers, {total} boundary nodes")
        }
        StageMetrics::PathScan {
            path_count,
            total_point_count,
            min_path_points,
            max_path_points,
            mean_path_points,
            holes_discarded,
            short_discarded,
        } => {
            format!(
                "{path_count} paths, {total_point_count} pts (min={min_path_points} max={max_path_points} mean={mean_path_points:.1}) dropped: {holes_discarded} holes {short_discarded} short",
            )
        }
        StageMetrics::Interpolation {
            path_count,
            internode_count,
        } => format!("{path_count} paths, {internode_count} internodes"),
        StageMetrics::CurveFit {
            line_tolerance,
            quad_tolerance,
            internode_count,
            line_count,
            quad_count,
            reduction_ratio,
        } => {
            format!(
                "ltol={line_tolerance:.2} qtol={quad_tolerance:.2} {internode_count}->{} segs ({line_count} lines, {quad_count} quads, {:.1}% reduction)",
                line_count + quad_count,
                reduction_ratio * 100.0,
            )
        }
        StageMetrics::Compose {
            strategy,
            input_path_count,
            drawable_count,
            dropped_count,
        } => {
            format!("{strategy} {input_path_count} paths -> {drawable_count} drawables ({dropped_count} dropped)")
        }
    }
}

/// Statistics for a set of path lengths.
pub(crate) struct PathStats {
    /// Total number of points across all paths.
    pub total: usize,
    /// Minimum number of points in any single path.
    pub min: usize,
    /// Maximum number of points in any single path.
    pub max: usize,
    /// Mean number of points per path.
    pub mean: f64,
}

/// Compute path statistics from per-path point counts.
pub(crate) fn path_stats(lengths: &[usize]) -> PathStats {
    let total: usize = lengths.iter().sum();
    let min = lengths.iter().copied().min().unwrap_or(0);
    let max = lengths.iter().copied().max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if lengths.is_empty() {
        0.0
    } else {
        total as f64 / lengths.len() as f64
    };
    PathStats {
        total,
        min,
        max,
        mean,
    }
}
