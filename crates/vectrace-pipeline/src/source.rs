//! Input pixel buffers and image decoding.
//!
//! The tracing core only reads packed, row-major RGB or RGBA bytes
//! through [`PixelBuffer`]. Hosts that start from an encoded file can
//! use [`decode`] to get there (PNG, JPEG, BMP, WebP, whatever the
//! `image` crate can decode).

use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError};

/// Immutable, validated pixel data.
///
/// The byte length always equals `width * height * channels`, with
/// `channels` either 3 (RGB) or 4 (RGBA), and both dimensions are
/// non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap packed pixel bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if either dimension is
    /// zero, `channels` is not 3 or 4, or `data` is not exactly
    /// `width * height * channels` bytes long.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "image dimensions must be non-zero (got {width}x{height})"
            )));
        }
        if !matches!(channels, 3 | 4) {
            return Err(PipelineError::InvalidInput(format!(
                "expected 3 or 4 channels per pixel (got {channels})"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(usize::from(channels)))
            .ok_or_else(|| {
                PipelineError::InvalidInput(format!("image {width}x{height} is too large"))
            })?;
        if data.len() != expected {
            return Err(PipelineError::InvalidInput(format!(
                "buffer holds {} bytes, expected {expected} for {width}x{height}x{channels}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Wrap packed RGB bytes (3 per pixel).
    ///
    /// # Errors
    ///
    /// See [`PixelBuffer::new`].
    pub fn rgb(data: Vec<u8>, width: u32, height: u32) -> Result<Self, PipelineError> {
        Self::new(data, width, height, 3)
    }

    /// Wrap packed RGBA bytes (4 per pixel).
    ///
    /// # Errors
    ///
    /// See [`PixelBuffer::new`].
    pub fn rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, PipelineError> {
        Self::new(data, width, height, 4)
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel (3 or 4).
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Width and height as [`Dimensions`].
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// The raw packed bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// First channel (red) of the pixel at column `x`, row `y`.
    #[must_use]
    pub fn channel0(&self, x: u32, y: u32) -> u8 {
        let index = (y as usize * self.width as usize + x as usize) * usize::from(self.channels);
        self.data[index]
    }
}

impl TryFrom<RgbImage> for PixelBuffer {
    type Error = PipelineError;

    fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::rgb(image.into_raw(), width, height)
    }
}

impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = PipelineError;

    fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::rgba(image.into_raw(), width, height)
    }
}

/// Decode raw image bytes into an RGB [`PixelBuffer`].
///
/// Alpha is dropped; tracing only looks at the first channel.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty,
/// [`PipelineError::ImageDecode`] if the format is unrecognized or the
/// data is corrupt, and [`PipelineError::InvalidInput`] for images with
/// a zero dimension.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    from_dynamic(&img)
}

/// Convert an already-decoded image into an RGB [`PixelBuffer`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] for images with a zero
/// dimension.
pub fn from_dynamic(image: &DynamicImage) -> Result<PixelBuffer, PipelineError> {
    PixelBuffer::try_from(image.to_rgb8())
}
