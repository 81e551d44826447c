//! Shared types for the vectrace pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compose::{Drawable, ZOrderKind};
use crate::quantize::Palette;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    /// Fully opaque color from its RGB components.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Formats as a CSS `rgb(r,g,b)` functional color.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Row-major 2D grid of cells.
///
/// Both the region grid and the per-region edge-node grids use the
/// padded layout: `(image width + 2) x (image height + 2)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Create a grid with every cell set to `fill`.
    #[must_use]
    pub fn filled(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Cell at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.cells[y * self.width + x]
    }

    /// Cell at column `x`, row `y`, or `None` outside the grid.
    #[must_use]
    pub fn try_get(&self, x: usize, y: usize) -> Option<T> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Overwrite the cell at column `x`, row `y`.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[y * self.width + x] = value;
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// One row of cells.
    #[must_use]
    pub fn row(&self, y: usize) -> &[T] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }
}

/// Eight-way travel bearing between consecutive internodes.
///
/// The discriminants are the compass codes used by the run segmentation
/// in [`crate::fit`]. [`Center`](Self::Center) marks two coincident
/// points and does not occur on well-formed boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    East = 0,
    SouthEast = 1,
    South = 2,
    SouthWest = 3,
    West = 4,
    NorthWest = 5,
    North = 6,
    NorthEast = 7,
    Center = 8,
}

impl Direction {
    /// Numeric compass code (`0..=8`).
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// One corner of a traced boundary polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Corner column in image coordinates (padding removed).
    pub x: i32,
    /// Corner row in image coordinates (padding removed).
    pub y: i32,
    /// Edge-node code of the corner when the walk visited it.
    pub node: u8,
}

impl PathPoint {
    /// Corner position as a floating-point [`Point`].
    #[must_use]
    pub fn position(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// A path point halfway between two boundary corners, with its bearing
/// towards the next internode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Internode {
    pub point: Point,
    pub direction: Direction,
}

/// A fitted path segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Straight line from `start` to `end`.
    Line { start: Point, end: Point },
    /// Quadratic Bezier from `start` to `end` bent towards `control`.
    Quad {
        start: Point,
        control: Point,
        end: Point,
    },
}

impl Segment {
    /// Record tag for [`Line`](Self::Line) segments.
    pub const LINE_KIND: u8 = 1;
    /// Record tag for [`Quad`](Self::Quad) segments.
    pub const QUAD_KIND: u8 = 2;

    /// First point of the segment.
    #[must_use]
    pub const fn start(&self) -> Point {
        match *self {
            Self::Line { start, .. } | Self::Quad { start, .. } => start,
        }
    }

    /// Last point of the segment.
    #[must_use]
    pub const fn end(&self) -> Point {
        match *self {
            Self::Line { end, .. } | Self::Quad { end, .. } => end,
        }
    }

    /// `1` for lines, `2` for quadratic curves.
    #[must_use]
    pub const fn kind(&self) -> u8 {
        match self {
            Self::Line { .. } => Self::LINE_KIND,
            Self::Quad { .. } => Self::QUAD_KIND,
        }
    }

    /// Flat seven-slot record: `[kind, x1, y1, x2, y2, x3, y3]`.
    ///
    /// Lines store their end point in slots 3-4 and zeros in 5-6;
    /// quads store the control point in 3-4 and the end point in 5-6.
    #[must_use]
    pub fn to_record(&self) -> [f64; 7] {
        match *self {
            Self::Line { start, end } => [
                f64::from(Self::LINE_KIND),
                start.x,
                start.y,
                end.x,
                end.y,
                0.0,
                0.0,
            ],
            Self::Quad {
                start,
                control,
                end,
            } => [
                f64::from(Self::QUAD_KIND),
                start.x,
                start.y,
                control.x,
                control.y,
                end.x,
                end.y,
            ],
        }
    }
}

/// Generates a closed-path newtype over `Vec<$item>` with the usual
/// read-only accessors.
macro_rules! closed_path {
    ($(#[$meta:meta])* $name:ident, $item:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name(Vec<$item>);

        impl $name {
            /// Wrap an ordered, cyclically closed sequence.
            #[must_use]
            pub const fn new(items: Vec<$item>) -> Self {
                Self(items)
            }

            /// Returns `true` if the path has no elements.
            #[must_use]
            pub const fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Number of elements in the path.
            #[must_use]
            pub const fn len(&self) -> usize {
                self.0.len()
            }

            /// First element, if any.
            #[must_use]
            pub fn first(&self) -> Option<&$item> {
                self.0.first()
            }

            /// All elements in path order.
            #[must_use]
            pub fn as_slice(&self) -> &[$item] {
                &self.0
            }

            /// Iterate over the elements in path order.
            pub fn iter(&self) -> std::slice::Iter<'_, $item> {
                self.0.iter()
            }

            /// Consume the path and return its elements.
            #[must_use]
            pub fn into_vec(self) -> Vec<$item> {
                self.0
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $item;
            type IntoIter = std::slice::Iter<'a, $item>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }
    };
}

closed_path!(
    /// Closed polygon of grid corners produced by the boundary walk.
    ///
    /// The successor of the last point is the first point.
    BoundaryPath,
    PathPoint
);

closed_path!(
    /// Closed sequence of internodes, one per boundary corner.
    InterpolatedPath,
    Internode
);

closed_path!(
    /// Closed, chained sequence of fitted segments.
    TracedPath,
    Segment
);

impl TracedPath {
    /// Start of the first segment, where a renderer issues its move-to.
    #[must_use]
    pub fn start_point(&self) -> Option<Point> {
        self.0.first().map(Segment::start)
    }

    /// Whether every segment ends exactly where the next one starts,
    /// including the wrap from the last segment back to the first.
    #[must_use]
    pub fn is_chained(&self) -> bool {
        let n = self.0.len();
        (0..n).all(|i| self.0[i].end() == self.0[(i + 1) % n].start())
    }

    /// Number of quadratic segments.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.0.iter().filter(|s| matches!(s, Segment::Quad { .. })).count()
    }
}

/// Configuration for the tracing pipeline.
///
/// Tolerances are squared distances in pixels: a fitted line or curve
/// is accepted when no internode deviates from it by more than
/// `sqrt(tolerance)` pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Quantization threshold on the inverted first channel
    /// (`255 - R`). Scores below it fall into region 0.
    pub threshold: u8,

    /// Maximum squared deviation accepted for a straight-line fit.
    pub line_tolerance: f64,

    /// Maximum squared deviation accepted for a quadratic fit.
    pub quad_tolerance: f64,

    /// Boundary paths with fewer points than this are discarded.
    pub min_path_len: usize,

    /// How fitted paths are ordered for drawing.
    pub z_order: ZOrderKind,
}

impl PipelineConfig {
    pub const DEFAULT_THRESHOLD: u8 = 20;
    pub const DEFAULT_LINE_TOLERANCE: f64 = 10.0;
    pub const DEFAULT_QUAD_TOLERANCE: f64 = 10.0;
    pub const DEFAULT_MIN_PATH_LEN: usize = 1;

    /// Check the invariants the fitter relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if either tolerance is
    /// negative, NaN, or infinite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (name, value) in [
            ("line_tolerance", self.line_tolerance),
            ("quad_tolerance", self.quad_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            line_tolerance: Self::DEFAULT_LINE_TOLERANCE,
            quad_tolerance: Self::DEFAULT_QUAD_TOLERANCE,
            min_path_len: Self::DEFAULT_MIN_PATH_LEN,
            z_order: ZOrderKind::default(),
        }
    }
}

/// Result of running the full pipeline.
///
/// Contains the ordered drawables and the source image dimensions
/// needed by export serializers to set coordinate spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Styled, draw-ordered traced paths.
    pub drawables: Vec<Drawable>,

    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with every intermediate preserved.
///
/// Per-region collections are indexed by region: `boundaries[k][p]`,
/// `internodes[k][p]` and `traced[k][p]` all describe path `p` of
/// region `k`. The edge-node grids are not retained because the
/// boundary walk consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Quantized region grid (padded).
    pub regions: RegionGrid,
    /// Region colors.
    pub palette: Palette,
    /// Boundary polygons per region.
    pub boundaries: Vec<Vec<BoundaryPath>>,
    /// Interpolated paths per region.
    pub internodes: Vec<Vec<InterpolatedPath>>,
    /// Fitted paths per region.
    pub traced: Vec<Vec<TracedPath>>,
    /// Composed, draw-ordered output.
    pub drawables: Vec<Drawable>,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Total number of traced paths across all regions.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.traced.iter().map(Vec::len).sum()
    }

    /// Drop the intermediates, keeping only what [`crate::process`]
    /// returns.
    #[must_use]
    pub fn into_process_result(self) -> ProcessResult {
        ProcessResult {
            drawables: self.drawables,
            dimensions: self.dimensions,
        }
    }
}

/// Padded grid of region indices; the border holds
/// [`quantize::BORDER`](crate::quantize::BORDER).
pub type RegionGrid = Grid<i32>;

/// Padded grid of 4-bit edge-node codes for one region.
pub type EdgeNodeGrid = Grid<u8>;

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The pixel buffer does not describe a usable image.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The boundary walk reached a state no well-formed edge-node grid
    /// can produce.
    #[error("corrupt trace state at grid cell ({x}, {y}): {reason}")]
    CorruptTraceState {
        /// Padded grid column.
        x: usize,
        /// Padded grid row.
        y: usize,
        /// What went wrong.
        reason: String,
    },
}
