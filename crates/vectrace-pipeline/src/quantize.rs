//! Quantization: classify every pixel into a discrete region.
//!
//! The binary quantizer scores each pixel by its inverted first channel
//! (`255 - R`). Scores below the threshold become region 0 (light
//! pixels), everything else region 1.
//!
//! The output grid is padded by one cell on every side and the padding
//! holds [`BORDER`], which never equals a real region index. Later
//! stages can therefore read all eight neighbors of any image pixel
//! without bounds checks.

use serde::{Deserialize, Serialize};

use crate::source::PixelBuffer;
use crate::types::{Color, RegionGrid};

/// Region value stored in the padding cells.
pub const BORDER: i32 = -1;

/// The quantizer's color table.
///
/// Its length fixes the number of regions. For the binary quantizer the
/// entries are the fixed `{black, white}` table and do not say how a
/// region renders: region 0 holds the light pixels and is drawn white
/// (see [`crate::compose::style_for`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette(Vec<Color>);

impl Palette {
    /// The fixed two-entry palette of the binary quantizer.
    #[must_use]
    pub fn binary() -> Self {
        Self(vec![Color::BLACK, Color::WHITE])
    }

    /// Number of regions the palette describes.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.0.len()
    }

    /// Color of region `index`, if it exists.
    #[must_use]
    pub fn color(&self, index: usize) -> Option<Color> {
        self.0.get(index).copied()
    }

    /// All colors in region order.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.0
    }
}

/// Output of [`quantize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantization {
    /// Padded region grid.
    pub regions: RegionGrid,
    /// Color table; its length is the region count.
    pub palette: Palette,
}

/// Classify every pixel of `pixels` into region 0 or 1.
///
/// A pixel lands in region 0 when `255 - R < threshold`. The returned
/// grid is `(width + 2) x (height + 2)` with [`BORDER`] in the padding.
#[must_use = "returns the quantized region grid"]
pub fn quantize(pixels: &PixelBuffer, threshold: u8) -> Quantization {
    let width = pixels.width() as usize;
    let height = pixels.height() as usize;
    let mut regions = RegionGrid::filled(width + 2, height + 2, BORDER);

    for y in 0..pixels.height() {
        for x in 0..pixels.width() {
            let score = 255 - pixels.channel0(x, y);
            let region = i32::from(score >= threshold);
            regions.set(x as usize + 1, y as usize + 1, region);
        }
    }

    Quantization {
        regions,
        palette: Palette::binary(),
    }
}

/// Count image pixels per region (padding excluded).
#[must_use]
pub fn region_histogram(regions: &RegionGrid, region_count: usize) -> Vec<usize> {
    let mut counts = vec![0; region_count];
    for &value in regions.cells() {
        if let Ok(index) = usize::try_from(value)
            && let Some(count) = counts.get_mut(index)
        {
            *count += 1;
        }
    }
    counts
}
