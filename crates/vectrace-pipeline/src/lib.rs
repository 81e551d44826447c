//! vectrace-pipeline: Pure bitmap-to-vector tracing pipeline (sans-IO).
//!
//! Converts a raster image into closed vector outlines through:
//! quantize -> edge-node layers -> boundary walk -> internode
//! interpolation -> line/quadratic fitting -> composition.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! pixel buffers and returns structured data. Rendering the result
//! lives in `vectrace-export`, and the command-line harness in
//! `vectrace-bench`.

pub mod compose;
pub mod diagnostics;
pub mod fit;
pub mod internode;
pub mod layer;
pub mod pipeline;
pub mod quantize;
pub mod scan;
pub mod source;
pub mod types;

pub use compose::{Drawable, PathStyle, ZOrder, ZOrderKind};
pub use pipeline::Pipeline;
pub use quantize::Palette;
pub use source::PixelBuffer;
pub use types::{
    BoundaryPath, Color, Dimensions, Direction, EdgeNodeGrid, Grid, InterpolatedPath, Internode,
    PathPoint, PipelineConfig, PipelineError, Point, ProcessResult, RegionGrid, Segment,
    StagedResult, TracedPath,
};

/// Run the full tracing pipeline.
///
/// Takes a validated pixel buffer and a configuration, then produces a
/// [`ProcessResult`] containing the styled, draw-ordered paths and the
/// source image dimensions. The dimensions are needed by export
/// serializers to set coordinate spaces (e.g., SVG `viewBox`).
///
/// # Pipeline steps
///
/// 1. Quantize pixels into regions (threshold on the inverted first
///    channel) inside a one-cell sentinel border
/// 2. Classify every grid node of every region into a 4-bit edge code
/// 3. Walk the edge codes into closed boundary polygons, dropping holes
/// 4. Replace polygon corners with edge midpoints (internodes)
/// 5. Fit straight lines and quadratic splines within tolerance
/// 6. Order the fitted paths for drawing and attach region styles
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if a tolerance is negative
/// or not finite.
/// Returns [`PipelineError::CorruptTraceState`] if a boundary walk
/// reaches an impossible state.
pub fn process(
    pixels: &PixelBuffer,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    process_staged(pixels, config).map(StagedResult::into_process_result)
}

/// Run the full pipeline, preserving every intermediate.
///
/// Same steps as [`process`], but the returned [`StagedResult`] also
/// holds the region grid, boundary polygons, internode paths and
/// fitted paths. Use [`Pipeline`] to advance one stage at a time, or
/// [`diagnostics::process_staged_with_diagnostics`] to time each stage.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    pixels: &PixelBuffer,
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    use pipeline::PipelineStage;

    Pipeline::quantize(pixels, config.clone())?.complete()
}

/// Decode encoded image bytes and run the full pipeline.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized. Otherwise the same as [`process`].
pub fn process_image_bytes(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    let pixels = source::decode(image_bytes)?;
    process(&pixels, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Build an RGB buffer from rows of `0` (white) and `1` (black).
    fn bitmap(rows: &[&[u8]]) -> PixelBuffer {
        let height = u32::try_from(rows.len()).unwrap();
        let width = u32::try_from(rows[0].len()).unwrap();
        let data = rows
            .iter()
            .flat_map(|row| row.iter())
            .flat_map(|&bit| {
                let v = if bit == 1 { 0 } else { 255 };
                [v, v, v]
            })
            .collect();
        PixelBuffer::rgb(data, width, height).unwrap()
    }

    fn disc(size: u32, radius: f64) -> PixelBuffer {
        let center = f64::from(size - 1) / 2.0;
        let mut data = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let inside = (f64::from(x) - center).hypot(f64::from(y) - center) <= radius;
                let v = if inside { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        PixelBuffer::rgb(data, size, size).unwrap()
    }

    fn ends(path: &TracedPath) -> Vec<(f64, f64)> {
        path.iter().map(|s| (s.end().x, s.end().y)).collect()
    }

    fn kinds(path: &TracedPath) -> (usize, usize) {
        (path.len() - path.quad_count(), path.quad_count())
    }

    fn config(line_tolerance: f64, quad_tolerance: f64) -> PipelineConfig {
        PipelineConfig {
            line_tolerance,
            quad_tolerance,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn all_white_image_yields_only_the_frame() {
        let pixels = bitmap(&[&[0; 4], &[0; 4], &[0; 4], &[0; 4]]);
        let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();

        assert_eq!(staged.boundaries[0].len(), 1);
        assert_eq!(staged.boundaries[0][0].len(), 16);
        assert!(staged.boundaries[1].is_empty());

        let frame = &staged.traced[0][0];
        assert_eq!(kinds(frame), (4, 0));
        assert_eq!(
            ends(frame),
            vec![(4.0, 0.5), (3.5, 4.0), (0.0, 3.5), (0.5, 0.0)],
        );
        assert_eq!(staged.drawables.len(), 1);
        assert_eq!(staged.drawables[0].style.fill, Color::WHITE);
    }

    #[test]
    fn single_black_pixel() {
        let pixels = bitmap(&[&[0, 0, 0, 0], &[0, 1, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();

        let corners: Vec<_> = staged.boundaries[1][0]
            .iter()
            .map(|p| (p.x, p.y, p.node))
            .collect();
        assert_eq!(corners, vec![(1, 1, 4), (2, 1, 8), (2, 2, 1), (1, 2, 2)]);

        let pixel = &staged.traced[1][0];
        assert_eq!(ends(pixel), vec![(1.5, 2.0), (1.5, 1.0)]);
        assert_eq!(pixel.start_point(), Some(Point::new(1.5, 1.0)));

        // Frame first (starts on row 0), then the pixel outline.
        let regions: Vec<usize> = staged.drawables.iter().map(|d| d.region).collect();
        assert_eq!(regions, vec![0, 1]);
        assert_eq!(staged.drawables[1].style.fill, Color::BLACK);
    }

    #[test]
    fn horizontal_bar_is_all_lines() {
        let white: &[u8] = &[0; 8];
        let black: &[u8] = &[1; 8];
        let pixels = bitmap(&[white, white, black, white, white]);
        let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();

        let background: Vec<usize> = staged.boundaries[0].iter().map(BoundaryPath::len).collect();
        assert_eq!(background, vec![20, 20]);
        assert_eq!(staged.boundaries[1].len(), 1);
        assert_eq!(staged.boundaries[1][0].len(), 18);

        for path in staged.traced.iter().flatten() {
            assert_eq!(path.quad_count(), 0);
        }
        assert_eq!(staged.traced[0][0].len(), 4);
        assert_eq!(staged.traced[0][1].len(), 4);
        assert_eq!(staged.traced[1][0].len(), 3);
    }

    #[test]
    fn disc_fit_depends_on_tolerance() {
        let pixels = disc(24, 8.5);
        let outline = |lt, qt| {
            let staged = process_staged(&pixels, &config(lt, qt)).unwrap();
            assert_eq!(staged.boundaries[1][0].len(), 64);
            kinds(&staged.traced[1][0])
        };
        assert_eq!(outline(10.0, 10.0), (4, 0));
        assert_eq!(outline(1.0, 2.0), (0, 4));
        assert_eq!(outline(0.5, 0.5), (12, 0));
    }

    #[test]
    fn saddle_pattern_walks_each_region_once() {
        let pixels = bitmap(&[&[1, 0, 1], &[0, 1, 0], &[1, 0, 1]]);
        let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();
        assert_eq!(staged.boundaries[1].len(), 1);
        assert_eq!(staged.boundaries[1][0].len(), 20);
        assert_eq!(staged.boundaries[0].len(), 1);
        assert_eq!(staged.boundaries[0][0].len(), 12);
    }

    #[test]
    fn process_matches_staged_output() {
        let pixels = disc(16, 5.0);
        let config = PipelineConfig::default();
        let result = process(&pixels, &config).unwrap();
        let staged = process_staged(&pixels, &config).unwrap();
        assert_eq!(result, staged.into_process_result());
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 16,
                height: 16,
            },
        );
    }

    #[test]
    fn process_rejects_negative_tolerance() {
        let result = process(&disc(8, 2.0), &config(-0.5, 1.0));
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn process_image_bytes_decodes_png() {
        let img = image::RgbImage::from_fn(10, 10, |x, y| {
            if (3..7).contains(&x) && (3..7).contains(&y) {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();

        let result = process_image_bytes(buf.get_ref(), &PipelineConfig::default()).unwrap();
        assert_eq!(result.drawables.len(), 2);
        assert_eq!(result.dimensions.width, 10);
    }

    #[test]
    fn process_image_bytes_rejects_empty_input() {
        let result = process_image_bytes(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_image_bytes_rejects_garbage() {
        let result = process_image_bytes(&[0xde, 0xad, 0xbe, 0xef], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn random_bitmap() -> impl Strategy<Value = (u32, u32, Vec<bool>)> {
            (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
                (
                    Just(w),
                    Just(h),
                    proptest::collection::vec(any::<bool>(), (w * h) as usize),
                )
            })
        }

        fn to_pixels(width: u32, height: u32, bits: &[bool]) -> PixelBuffer {
            let data = bits
                .iter()
                .flat_map(|&black| {
                    let v = if black { 0 } else { 255 };
                    [v, v, v]
                })
                .collect();
            PixelBuffer::rgb(data, width, height).unwrap()
        }

        proptest! {
            #[test]
            fn every_traced_path_is_closed((w, h, bits) in random_bitmap()) {
                let pixels = to_pixels(w, h, &bits);
                let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();
                for path in staged.traced.iter().flatten() {
                    prop_assert!(!path.is_empty());
                    prop_assert!(path.is_chained());
                }
            }

            #[test]
            fn boundary_paths_are_rectilinear_loops((w, h, bits) in random_bitmap()) {
                let pixels = to_pixels(w, h, &bits);
                let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();
                for path in staged.boundaries.iter().flatten() {
                    let corners = path.as_slice();
                    for (i, a) in corners.iter().enumerate() {
                        let b = corners[(i + 1) % corners.len()];
                        let step = (a.x - b.x).abs() + (a.y - b.y).abs();
                        prop_assert!(step <= 1, "jump from {:?} to {:?}", a, b);
                    }
                }
            }

            #[test]
            fn stable_order_keeps_every_path((w, h, bits) in random_bitmap()) {
                let pixels = to_pixels(w, h, &bits);
                let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();
                prop_assert_eq!(staged.drawables.len(), staged.path_count());
                let keys: Vec<f64> = staged.drawables.iter().map(|d| d.order_key).collect();
                prop_assert!(keys.windows(2).all(|k| k[0] <= k[1]));
            }

            #[test]
            fn regions_partition_the_image((w, h, bits) in random_bitmap()) {
                let pixels = to_pixels(w, h, &bits);
                let staged = process_staged(&pixels, &PipelineConfig::default()).unwrap();
                let histogram = quantize::region_histogram(
                    &staged.regions,
                    staged.palette.region_count(),
                );
                prop_assert_eq!(histogram.iter().sum::<usize>(), (w * h) as usize);
                prop_assert_eq!(histogram[1], bits.iter().filter(|&&b| b).count());
            }
        }
    }
}
