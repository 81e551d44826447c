//! vectrace-bench: CLI tool for tracing parameter experimentation and diagnostics.
//!
//! Runs the tracing pipeline on a given image file with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Tuning the quantization threshold and fit tolerances
//! - Comparing draw-order strategies (`stable` vs `last-wins`)
//! - Measuring per-stage durations to identify bottlenecks
//! - Seeing how parameter changes affect path and segment counts
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin vectrace-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use vectrace_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use vectrace_pipeline::{PipelineConfig, StagedResult, ZOrderKind};

/// Tracing parameter experimentation and diagnostics for vectrace.
///
/// Runs the bitmap tracing pipeline on a given image with configurable
/// parameters and prints detailed per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "vectrace-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Quantization threshold on the inverted red channel (0-255).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Squared-distance tolerance for straight-line fits.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_LINE_TOLERANCE)]
    line_tolerance: f64,

    /// Squared-distance tolerance for quadratic fits.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_QUAD_TOLERANCE)]
    quad_tolerance: f64,

    /// Discard boundary paths with fewer corner points than this.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MIN_PATH_LEN)]
    min_path_len: usize,

    /// Draw-order strategy.
    #[arg(long, value_enum, default_value_t = ZOrder::Stable)]
    z_order: ZOrder,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a diagnostic SVG with the raw boundary polygons overlaid.
    #[arg(long)]
    boundary_svg: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Draw-order strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum ZOrder {
    /// Every path kept, ordered by start point, region, path index.
    Stable,
    /// One path per start point; the last one processed wins.
    LastWins,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        threshold: cli.threshold,
        line_tolerance: cli.line_tolerance,
        quad_tolerance: cli.quad_tolerance,
        min_path_len: cli.min_path_len,
        z_order: match cli.z_order {
            ZOrder::Stable => ZOrderKind::Stable,
            ZOrder::LastWins => ZOrderKind::LastWins,
        },
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );

    let pixels = match vectrace_pipeline::source::decode(&image_bytes) {
        Ok(pixels) => pixels,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Decoded: {}x{}", pixels.width(), pixels.height());
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match vectrace_pipeline::diagnostics::process_staged_with_diagnostics(
            &pixels, &config, &StdClock,
        ) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write SVGs on the first run only.
                if run == 0 {
                    write_svgs(&cli, &config, &staged);
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write the requested SVG files for one pipeline result.
///
/// Failures are reported on stderr and do not abort the run.
fn write_svgs(cli: &Cli, config: &PipelineConfig, staged: &StagedResult) {
    if cli.svg.is_none() && cli.boundary_svg.is_none() {
        return;
    }

    let title = cli
        .image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bench");
    let desc = format!("{config:#?}");
    let config_json = serde_json::to_string(config).ok();
    let metadata = vectrace_export::SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json: config_json.as_deref(),
    };

    if let Some(ref svg_path) = cli.svg {
        let svg = vectrace_export::to_svg(&staged.drawables, staged.dimensions, &metadata);
        write_file(svg_path, &svg);
    }

    if let Some(ref svg_path) = cli.boundary_svg {
        let svg = vectrace_export::to_boundary_svg(
            &staged.drawables,
            &staged.boundaries,
            staged.dimensions,
            &metadata,
        );
        write_file(svg_path, &svg);
    }
}

fn write_file(path: &Path, contents: &str) {
    match std::fs::write(path, contents) {
        Ok(()) => {
            eprintln!(
                "SVG written to {} ({} bytes)",
                path.display(),
                contents.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing SVG to {}: {e}", path.display());
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Quantize", |d| d.quantize.duration),
        ("Layering", |d| d.layering.duration),
        ("Path Scan", |d| d.scan.duration),
        ("Interpolation", |d| d.interpolation.duration),
        ("Curve Fit", |d| d.fit.duration),
        ("Compose", |d| d.compose.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
