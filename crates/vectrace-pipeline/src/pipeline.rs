//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process_staged`] which runs the entire pipeline in one
//! call, [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use vectrace_pipeline::{Pipeline, PipelineConfig, PipelineError, PixelBuffer};
//! # fn run(pixels: PixelBuffer) -> Result<(), PipelineError> {
//! let config = PipelineConfig::default();
//! let pipeline = Pipeline::new(pixels, config)
//!     .quantize()?
//!     .build_layers()
//!     .scan()?
//!     .interpolate()
//!     .fit()
//!     .compose();
//!
//! let staged = pipeline.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying all previously computed
//! intermediates. The caller can inspect the current stage's output via
//! accessor methods at any point.
//!
//! The edge-node grids are the one exception: [`Layered::scan`] walks
//! them destructively, so they are dropped once the boundaries exist.

use crate::compose::Drawable;
use crate::diagnostics::{StageMetrics, path_stats};
use crate::quantize::{Palette, region_histogram};
use crate::source::PixelBuffer;
use crate::types::{
    BoundaryPath, Dimensions, EdgeNodeGrid, InterpolatedPath, PipelineConfig, PipelineError,
    RegionGrid, StagedResult, TracedPath,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The source pixels and config are stored but not yet touched.
/// Call [`quantize`](Self::quantize) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .quantize() to continue"]
pub struct Pending {
    config: PipelineConfig,
    pixels: PixelBuffer,
}

impl Pending {
    /// The source pixels.
    #[must_use]
    pub const fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Validate the config and classify every pixel into a region.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the config fails
    /// [`PipelineConfig::validate`].
    pub fn quantize(self) -> Result<Quantized, PipelineError> {
        Pipeline::quantize(&self.pixels, self.config)
    }
}

// ───────────────────────── Stage 1: Quantized ────────────────────────

/// Pipeline state after region quantization.
///
/// Call [`build_layers`](Self::build_layers) to advance to the next
/// stage.
#[must_use = "pipeline stages are consumed by advancing — call .build_layers() to continue"]
pub struct Quantized {
    config: PipelineConfig,
    dimensions: Dimensions,
    regions: RegionGrid,
    palette: Palette,
}

impl Quantized {
    /// The padded region grid.
    #[must_use]
    pub const fn regions(&self) -> &RegionGrid {
        &self.regions
    }

    /// The region colors.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Advance to the edge-node classification stage.
    pub fn build_layers(self) -> Layered {
        let layers = crate::layer::build_layers(&self.regions, self.palette.region_count());
        Layered {
            config: self.config,
            dimensions: self.dimensions,
            regions: self.regions,
            palette: self.palette,
            layers,
        }
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Quantize {
            width: self.dimensions.width,
            height: self.dimensions.height,
            pixel_count: u64::from(self.dimensions.width) * u64::from(self.dimensions.height),
            threshold: self.config.threshold,
            region_pixel_counts: region_histogram(&self.regions, self.palette.region_count()),
        }
    }
}

// ───────────────────────── Stage 2: Layered ──────────────────────────

/// Pipeline state after edge-node classification.
///
/// Call [`scan`](Self::scan) to advance to the next stage. This is a
/// fallible step: it returns `Err` if a grid walk hits an impossible
/// state.
#[must_use = "pipeline stages are consumed by advancing — call .scan() to continue"]
pub struct Layered {
    config: PipelineConfig,
    dimensions: Dimensions,
    regions: RegionGrid,
    palette: Palette,
    layers: Vec<EdgeNodeGrid>,
}

impl Layered {
    /// One edge-node grid per region.
    #[must_use]
    pub fn layers(&self) -> &[EdgeNodeGrid] {
        &self.layers
    }

    /// Walk every layer and advance to the [`Scanned`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CorruptTraceState`] if a walk reaches a
    /// state no well-formed grid produces.
    pub fn scan(self) -> Result<Scanned, PipelineError> {
        let mut boundaries = Vec::with_capacity(self.layers.len());
        let mut holes_discarded = 0;
        let mut short_discarded = 0;
        for layer in self.layers {
            let outcome = crate::scan::scan_counted(layer, self.config.min_path_len)?;
            holes_discarded += outcome.holes_discarded;
            short_discarded += outcome.short_discarded;
            boundaries.push(outcome.paths);
        }
        Ok(Scanned {
            config: self.config,
            dimensions: self.dimensions,
            regions: self.regions,
            palette: self.palette,
            boundaries,
            holes_discarded,
            short_discarded,
        })
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Layering {
            layer_count: self.layers.len(),
            boundary_nodes: self
                .layers
                .iter()
                .map(crate::layer::boundary_node_count)
                .collect(),
        }
    }
}

// ───────────────────────── Stage 3: Scanned ──────────────────────────

/// Pipeline state after boundary walking.
///
/// Call [`interpolate`](Self::interpolate) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .interpolate() to continue"]
pub struct Scanned {
    config: PipelineConfig,
    dimensions: Dimensions,
    regions: RegionGrid,
    palette: Palette,
    boundaries: Vec<Vec<BoundaryPath>>,
    holes_discarded: usize,
    short_discarded: usize,
}

impl Scanned {
    /// Boundary polygons, indexed by region.
    #[must_use]
    pub fn boundaries(&self) -> &[Vec<BoundaryPath>] {
        &self.boundaries
    }

    /// Advance to the interpolation stage.
    pub fn interpolate(self) -> Interpolated {
        let internodes = self
            .boundaries
            .iter()
            .map(|paths| paths.iter().map(crate::internode::interpolate).collect())
            .collect();
        Interpolated {
            config: self.config,
            dimensions: self.dimensions,
            regions: self.regions,
            palette: self.palette,
            boundaries: self.boundaries,
            internodes,
        }
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let lengths: Vec<usize> = self.boundaries.iter().flatten().map(BoundaryPath::len).collect();
        let stats = path_stats(&lengths);
        StageMetrics::PathScan {
            path_count: lengths.len(),
            total_point_count: stats.total,
            min_path_points: stats.min,
            max_path_points: stats.max,
            mean_path_points: stats.mean,
            holes_discarded: self.holes_discarded,
            short_discarded: self.short_discarded,
        }
    }
}

// ───────────────────────── Stage 4: Interpolated ─────────────────────

/// Pipeline state after internode interpolation.
///
/// Call [`fit`](Self::fit) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .fit() to continue"]
pub struct Interpolated {
    config: PipelineConfig,
    dimensions: Dimensions,
    regions: RegionGrid,
    palette: Palette,
    boundaries: Vec<Vec<BoundaryPath>>,
    internodes: Vec<Vec<InterpolatedPath>>,
}

impl Interpolated {
    /// Internode paths, indexed by region.
    #[must_use]
    pub fn internodes(&self) -> &[Vec<InterpolatedPath>] {
        &self.internodes
    }

    /// Advance to the curve fitting stage.
    pub fn fit(self) -> Fitted {
        let traced = self
            .internodes
            .iter()
            .map(|paths| {
                crate::fit::trace_paths(
                    paths,
                    self.config.line_tolerance,
                    self.config.quad_tolerance,
                )
            })
            .collect();
        Fitted {
            config: self.config,
            dimensions: self.dimensions,
            regions: self.regions,
            palette: self.palette,
            boundaries: self.boundaries,
            internodes: self.internodes,
            traced,
        }
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Interpolation {
            path_count: self.internodes.iter().map(Vec::len).sum(),
            internode_count: self
                .internodes
                .iter()
                .flatten()
                .map(InterpolatedPath::len)
                .sum(),
        }
    }
}

// ───────────────────────── Stage 5: Fitted ───────────────────────────

/// Pipeline state after curve fitting.
///
/// Call [`compose`](Self::compose) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing — call .compose() to continue"]
pub struct Fitted {
    config: PipelineConfig,
    dimensions: Dimensions,
    regions: RegionGrid,
    palette: Palette,
    boundaries: Vec<Vec<BoundaryPath>>,
    internodes: Vec<Vec<InterpolatedPath>>,
    traced: Vec<Vec<TracedPath>>,
}

impl Fitted {
    /// Fitted paths, indexed by region.
    #[must_use]
    pub fn traced(&self) -> &[Vec<TracedPath>] {
        &self.traced
    }

    /// Advance to the composition stage, the final pipeline step.
    pub fn compose(self) -> Composed {
        let drawables =
            crate::compose::compose(&self.traced, self.regions.width(), self.config.z_order);
        Composed {
            config: self.config,
            dimensions: self.dimensions,
            regions: self.regions,
            palette: self.palette,
            boundaries: self.boundaries,
            internodes: self.internodes,
            traced: self.traced,
            drawables,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let paths = || self.traced.iter().flatten();
        let segment_count: usize = paths().map(TracedPath::len).sum();
        let quad_count: usize = paths().map(TracedPath::quad_count).sum();
        let internode_count: usize = self
            .internodes
            .iter()
            .flatten()
            .map(InterpolatedPath::len)
            .sum();
        let reduction_ratio = if internode_count > 0 {
            1.0 - (segment_count as f64 / internode_count as f64)
        } else {
            0.0
        };
        StageMetrics::CurveFit {
            line_tolerance: self.config.line_tolerance,
            quad_tolerance: self.config.quad_tolerance,
            internode_count,
            line_count: segment_count - quad_count,
            quad_count,
            reduction_ratio,
        }
    }
}

// ───────────────────────── Stage 6: Composed ─────────────────────────

/// Pipeline state after composition, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`StagedResult`] containing all intermediates.
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Composed {
    config: PipelineConfig,
    dimensions: Dimensions,
    regions: RegionGrid,
    palette: Palette,
    boundaries: Vec<Vec<BoundaryPath>>,
    internodes: Vec<Vec<InterpolatedPath>>,
    traced: Vec<Vec<TracedPath>>,
    drawables: Vec<Drawable>,
}

impl Composed {
    /// The ordered, styled output paths.
    #[must_use]
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            regions: self.regions,
            palette: self.palette,
            boundaries: self.boundaries,
            internodes: self.internodes,
            traced: self.traced,
            drawables: self.drawables,
            dimensions: self.dimensions,
        }
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let input_path_count: usize = self.traced.iter().map(Vec::len).sum();
        StageMetrics::Compose {
            strategy: self.config.z_order.to_string(),
            input_path_count,
            drawable_count: self.drawables.len(),
            dropped_count: input_path_count.saturating_sub(self.drawables.len()),
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 7;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
/// Use this with [`PipelineStage::output`] or [`Stage::output`] to
/// inspect intermediates in a uniform, type-erased way.
#[must_use]
pub enum StageOutput<'a> {
    /// Source pixels (not yet quantized).
    Source {
        /// The input pixel buffer.
        pixels: &'a PixelBuffer,
    },
    /// Region grid.
    Quantized {
        /// The padded region grid.
        regions: &'a RegionGrid,
        /// The region colors.
        palette: &'a Palette,
    },
    /// Edge-node grids.
    Layered {
        /// One grid per region.
        layers: &'a [EdgeNodeGrid],
    },
    /// Boundary walking result.
    Scanned {
        /// Boundary polygons per region.
        boundaries: &'a [Vec<BoundaryPath>],
    },
    /// Interpolation result.
    Interpolated {
        /// Internode paths per region.
        internodes: &'a [Vec<InterpolatedPath>],
    },
    /// Curve fitting result.
    Fitted {
        /// Fitted paths per region.
        traced: &'a [Vec<TracedPath>],
    },
    /// Composition result.
    Composed {
        /// The ordered, styled output paths.
        drawables: &'a [Drawable],
        /// Image dimensions.
        dimensions: Dimensions,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Both the typed API (individual stage structs) and the dynamic API
/// ([`Stage`] enum) are available. This trait bridges the two: each
/// stage struct implements it, and [`Stage`] delegates to whichever
/// variant it holds.
///
/// # Loop pattern
///
/// ```rust
/// # use vectrace_pipeline::{Pipeline, PipelineConfig, PipelineError, PixelBuffer};
/// # use vectrace_pipeline::pipeline::{Stage, PipelineStage, Advance};
/// # fn run(pixels: PixelBuffer) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(pixels, PipelineConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"source"`, `"fit"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `6` for
    /// Composed).
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial [`Pending`] stage which has not
    /// yet performed any processing. All other stages return
    /// `Some(metrics)` describing the work done to reach this state.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at
    /// the final stage, or `Err` if the stage transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when quantization
    /// rejects the config, and [`PipelineError::CorruptTraceState`]
    /// when a boundary walk fails.
    fn next(self) -> Result<Option<Stage>, PipelineError>;

    /// Run all remaining stages to completion and return the final
    /// [`StagedResult`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    fn complete(self) -> Result<StagedResult, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            pixels: &self.pixels,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Quantized(self.quantize()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.quantize()?.complete()
    }
}

impl PipelineStage for Quantized {
    const NAME: &str = "quantize";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Quantized {
            regions: &self.regions,
            palette: &self.palette,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Layered(self.build_layers())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.build_layers().complete()
    }
}

impl PipelineStage for Layered {
    const NAME: &str = "layer";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Layered {
            layers: &self.layers,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Scanned(self.scan()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.scan()?.complete()
    }
}

impl PipelineStage for Scanned {
    const NAME: &str = "scan";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Scanned {
            boundaries: &self.boundaries,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Interpolated(self.interpolate())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.interpolate().complete()
    }
}

impl PipelineStage for Interpolated {
    const NAME: &str = "interpolate";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Interpolated {
            internodes: &self.internodes,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Fitted(self.fit())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.fit().complete()
    }
}

impl PipelineStage for Fitted {
    const NAME: &str = "fit";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Fitted {
            traced: &self.traced,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Composed(self.compose())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.compose().into_result())
    }
}

impl PipelineStage for Composed {
    const NAME: &str = "compose";
    const INDEX: usize = 6;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Composed {
            drawables: &self.drawables,
            dimensions: self.dimensions,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(None)
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping all pipeline stages for uniform, loopable access.
///
/// Use [`From`] conversions to enter the dynamic API from any typed
/// stage, then call [`advance`](Self::advance) in a loop.
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Quantized`].
    Quantized(Quantized),
    /// See [`Layered`].
    Layered(Layered),
    /// See [`Scanned`].
    Scanned(Scanned),
    /// See [`Interpolated`].
    Interpolated(Interpolated),
    /// See [`Fitted`].
    Fitted(Fitted),
    /// See [`Composed`].
    Composed(Composed),
}

/// Compile-time guard: if a [`Stage`] variant is added, this match becomes
/// non-exhaustive and the build fails, so [`STAGE_COUNT`] gets bumped.
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Quantized(_)
        | Stage::Layered(_)
        | Stage::Scanned(_)
        | Stage::Interpolated(_)
        | Stage::Fitted(_)
        | Stage::Composed(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage and is returned
    /// unchanged.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Quantized(s) => s.$method($($arg),*),
            Self::Layered(s) => s.$method($($arg),*),
            Self::Scanned(s) => s.$method($($arg),*),
            Self::Interpolated(s) => s.$method($($arg),*),
            Self::Fitted(s) => s.$method($($arg),*),
            Self::Composed(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial `Pending` stage.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Composed(_))
    }

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(next_stage))` on success, `Ok(None)` if
    /// already complete (the `Composed` value is consumed), or `Err` if
    /// the transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn next(self) -> Result<Option<Self>, PipelineError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if
    /// already complete.
    ///
    /// This is the loop-friendly version of [`next`](Self::next).
    /// Unlike `next()`, which consumes the final stage and returns
    /// `Ok(None)`, `advance()` returns [`Advance::Complete`] with
    /// the final stage so you can still call
    /// [`complete`](Self::complete) on it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn advance(self) -> Result<Advance, PipelineError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        // Non-complete stages always return Ok(Some(_)) from next().
        #[allow(clippy::unreachable)]
        let next = self
            .next()?
            .unwrap_or_else(|| unreachable!("non-complete stage returned None from next()"));
        Ok(Advance::Next(next))
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    pub fn complete(self) -> Result<StagedResult, PipelineError> {
        delegate!(self, complete)
    }
}

// `PipelineStage`'s associated constants aren't callable via
// `self.NAME`, so the macro goes through this helper trait.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Quantized> for Stage {
    fn from(s: Quantized) -> Self {
        Self::Quantized(s)
    }
}

impl From<Layered> for Stage {
    fn from(s: Layered) -> Self {
        Self::Layered(s)
    }
}

impl From<Scanned> for Stage {
    fn from(s: Scanned) -> Self {
        Self::Scanned(s)
    }
}

impl From<Interpolated> for Stage {
    fn from(s: Interpolated) -> Self {
        Self::Interpolated(s)
    }
}

impl From<Fitted> for Stage {
    fn from(s: Fitted) -> Self {
        Self::Fitted(s)
    }
}

impl From<Composed> for Stage {
    fn from(s: Composed) -> Self {
        Self::Composed(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental tracing pipeline.
///
/// Created via [`Pipeline::new`], which stores the source pixels and
/// config without doing any processing. The caller then chains stage
/// methods to advance through the pipeline:
///
/// ```rust
/// # use vectrace_pipeline::{Pipeline, PipelineConfig, PipelineError, PixelBuffer};
/// # fn run(pixels: PixelBuffer) -> Result<(), PipelineError> {
/// let result = Pipeline::new(pixels, PipelineConfig::default())
///     .quantize()?
///     .build_layers()
///     .scan()?
///     .interpolate()
///     .fit()
///     .compose()
///     .into_result();
/// # Ok(())
/// # }
/// ```
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from source pixels and config.
    ///
    /// No processing is performed. Call
    /// [`.quantize()`](Pending::quantize) (or convert to a [`Stage`]
    /// and loop) to begin processing.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(pixels: PixelBuffer, config: PipelineConfig) -> Pending {
        Pending { config, pixels }
    }

    /// Start a pipeline from borrowed pixels, going straight to
    /// [`Quantized`].
    ///
    /// Quantization only reads the source, so this skips [`Pending`]
    /// and never copies the pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the config fails
    /// [`PipelineConfig::validate`].
    pub fn quantize(
        pixels: &PixelBuffer,
        config: PipelineConfig,
    ) -> Result<Quantized, PipelineError> {
        config.validate()?;
        let quantization = crate::quantize::quantize(pixels, config.threshold);
        Ok(Quantized {
            config,
            dimensions: pixels.dimensions(),
            regions: quantization.regions,
            palette: quantization.palette,
        })
    }
}
