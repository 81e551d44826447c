//! SVG export serializer.
//!
//! Converts composed drawables into an SVG string with one `<path>`
//! element per drawable, using the [`svg`] crate for document
//! construction, XML escaping, and path data formatting.
//!
//! Each traced path becomes `M` (move to the first segment's start),
//! then `L` for straight segments and `Q` for quadratic segments, then
//! `Z`. Fill, stroke and opacity come from the drawable's region style.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use vectrace_pipeline::{BoundaryPath, Dimensions, Drawable, Segment, TracedPath};

/// XML namespace of the embedded `<vectrace:pipeline>` config element.
const PIPELINE_NAMESPACE: &str = "urn:vectrace:pipeline:1";

/// Metadata to embed in the SVG document.
///
/// All fields are optional.  When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.  These
/// are standard SVG accessibility elements and are surfaced by some file
/// managers and screen readers.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    ///
    /// Typically the tracing parameters, so exported files are
    /// distinguishable.
    pub description: Option<&'a str>,

    /// Structured pipeline configuration JSON, emitted inside a
    /// `<metadata>` element wrapped in a namespaced
    /// `<vectrace:pipeline>` element.
    ///
    /// Carries the full serialized `PipelineConfig` so exported files
    /// hold machine-parseable settings for reproducibility.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a traced path.
///
/// Starts with `M` at the first segment's start point, emits `L` for
/// each line and `Q` for each quadratic, and closes with `Z`. Returns
/// an empty string for an empty path.
///
/// Coordinates are formatted by the [`svg`] crate using `f32` precision
/// (sufficient for the half-pixel coordinates the tracer produces).
///
/// # Examples
///
/// ```
/// use vectrace_pipeline::{Point, Segment, TracedPath};
/// use vectrace_export::build_path_data;
///
/// let a = Point::new(1.5, 1.0);
/// let b = Point::new(1.5, 2.0);
/// let path = TracedPath::new(vec![
///     Segment::Line { start: a, end: b },
///     Segment::Line { start: b, end: a },
/// ]);
/// let d = build_path_data(&path);
/// assert!(d.starts_with("M1.5,1 L1.5,2 L1.5,1"));
/// ```
#[must_use]
pub fn build_path_data(path: &TracedPath) -> String {
    let Some(start) = path.start_point() else {
        return String::new();
    };

    let mut data = Data::new().move_to((start.x, start.y));
    for segment in path {
        data = match *segment {
            Segment::Line { end, .. } => data.line_to((end.x, end.y)),
            Segment::Quad { control, end, .. } => {
                data.quadratic_curve_to((control.x, control.y, end.x, end.y))
            }
        };
    }
    String::from(Value::from(data.close()))
}

// ---------------------------------------------------------------------------
// Shared helpers for the diagnostic SVG (manual string formatting)
// ---------------------------------------------------------------------------

/// Escape the five XML special characters for safe embedding in element
/// text content and attribute values.
///
/// Handles `&` (must be first), `<`, `>`, `"`, and `'`.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Write the SVG preamble: XML declaration, opening `<svg>` tag, and
/// optional `<title>`, `<desc>`, and `<metadata>` elements.
fn write_svg_preamble(out: &mut String, dimensions: Dimensions, metadata: &SvgMetadata<'_>) {
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        dimensions.width, dimensions.height, dimensions.width, dimensions.height,
    );

    if let Some(title) = metadata.title {
        let _ = writeln!(out, "  <title>{}</title>", xml_escape(title));
    }

    if let Some(description) = metadata.description {
        let _ = writeln!(out, "  <desc>{}</desc>", xml_escape(description));
    }

    if let Some(config_json) = metadata.config_json {
        let _ = writeln!(out, "  <metadata>");
        let _ = writeln!(
            out,
            "    <vectrace:pipeline xmlns:vectrace=\"{PIPELINE_NAMESPACE}\">{}</vectrace:pipeline>",
            xml_escape(config_json),
        );
        let _ = writeln!(out, "  </metadata>");
    }
}

/// `points` attribute for a boundary polygon, in corner order.
fn polygon_points(path: &BoundaryPath) -> String {
    path.iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Primary SVG export (uses `svg` crate)
// ---------------------------------------------------------------------------

/// Serialize drawables into an SVG document string.
///
/// Drawables are emitted in slice order, which is the painting order
/// the compositor chose. Each becomes a `<path>` with `fill`, `stroke`,
/// `stroke-width` and `opacity` taken from its style; empty paths are
/// skipped. The `viewBox` is set from [`Dimensions`] so the SVG
/// coordinate space matches the source image pixel grid.
///
/// If [`SvgMetadata::title`] or [`SvgMetadata::description`] is
/// provided, the corresponding `<title>` / `<desc>` element is emitted
/// after the opening `<svg>` tag.  If [`SvgMetadata::config_json`] is
/// provided, a `<metadata>` element is emitted containing the JSON
/// wrapped in a namespaced `<vectrace:pipeline>` element.
///
/// # Examples
///
/// ```
/// use vectrace_pipeline::{PipelineConfig, PixelBuffer, process};
/// use vectrace_export::{SvgMetadata, to_svg};
///
/// // 3x3 white image with a black center pixel.
/// let mut data = vec![255u8; 27];
/// data[12..15].copy_from_slice(&[0, 0, 0]);
/// let pixels = PixelBuffer::rgb(data, 3, 3).unwrap();
/// let result = process(&pixels, &PipelineConfig::default()).unwrap();
///
/// let metadata = SvgMetadata {
///     title: Some("dot"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&result.drawables, result.dimensions, &metadata);
/// assert!(svg.contains("<title>dot</title>"));
/// assert!(svg.contains(r#"viewBox="0 0 3 3""#));
/// ```
#[must_use]
pub fn to_svg(
    drawables: &[Drawable],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut pipeline_el = Element::new("vectrace:pipeline");
        pipeline_el.assign("xmlns:vectrace", PIPELINE_NAMESPACE);
        pipeline_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(pipeline_el);
        doc = doc.add(metadata_el);
    }

    for drawable in drawables {
        let d = build_path_data(&drawable.path);
        if d.is_empty() {
            continue;
        }

        let style = drawable.style;
        let path = Path::new()
            .set("d", d)
            .set("fill", style.fill.to_string())
            .set("stroke", style.stroke.to_string())
            .set("stroke-width", 1)
            .set("opacity", style.opacity);
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

// ---------------------------------------------------------------------------
// Diagnostic SVG export (manual string formatting)
// ---------------------------------------------------------------------------

/// Serialize fitted outlines with the raw boundary polygons overlaid.
///
/// Renders every drawable's outline in white on a dark background, then
/// each boundary polygon in red under `<g id="boundaries">`.  Comparing
/// the two layers shows how far the fitted curves stray from the pixel
/// staircase at the chosen tolerances.
///
/// `boundaries[k][p]` is polygon `p` of region `k`; each `<polygon>`
/// carries `data-region`, `data-path` and `data-points` attributes for
/// programmatic inspection.
#[must_use]
pub fn to_boundary_svg(
    drawables: &[Drawable],
    boundaries: &[Vec<BoundaryPath>],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let mut out = String::new();

    write_svg_preamble(&mut out, dimensions, metadata);

    let _ = writeln!(
        out,
        "  <rect width=\"{}\" height=\"{}\" fill=\"#1a1a1a\"/>",
        dimensions.width, dimensions.height,
    );

    let _ = writeln!(
        out,
        r#"  <g id="outlines" stroke="white" stroke-width="0.1" fill="none">"#
    );
    for drawable in drawables {
        let d = build_path_data(&drawable.path);
        if !d.is_empty() {
            let _ = writeln!(out, r#"    <path d="{d}" data-region="{}"/>"#, drawable.region);
        }
    }
    let _ = writeln!(out, "  </g>");

    let polygon_count: usize = boundaries.iter().map(Vec::len).sum();
    if polygon_count > 0 {
        let _ = writeln!(out, "  <!-- boundary polygons: {polygon_count} total -->");
        let _ = writeln!(
            out,
            r#"  <g id="boundaries" stroke="red" stroke-width="0.05" fill="none" opacity="0.9">"#,
        );
        for (region, paths) in boundaries.iter().enumerate() {
            for (index, path) in paths.iter().enumerate() {
                if path.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    out,
                    r#"    <polygon points="{}" data-region="{region}" data-path="{index}" data-points="{}"/>"#,
                    polygon_points(path),
                    path.len(),
                );
            }
        }
        let _ = writeln!(out, "  </g>");
    }

    let _ = writeln!(out, "</svg>");

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vectrace_pipeline::compose::style_for;
    use vectrace_pipeline::{Color, PathPoint, PathStyle, Point};

    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    /// Shorthand: no metadata.
    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    fn line(ax: f64, ay: f64, bx: f64, by: f64) -> Segment {
        Segment::Line {
            start: Point::new(ax, ay),
            end: Point::new(bx, by),
        }
    }

    /// Closed triangle of three lines.
    fn triangle() -> TracedPath {
        TracedPath::new(vec![
            line(10.0, 20.0, 30.0, 20.0),
            line(30.0, 20.0, 10.0, 40.0),
            line(10.0, 40.0, 10.0, 20.0),
        ])
    }

    fn drawable(region: usize, path: TracedPath) -> Drawable {
        Drawable {
            region,
            path_index: 0,
            order_key: 0.0,
            style: style_for(region),
            path,
        }
    }

    fn boundary(corners: &[(i32, i32)]) -> BoundaryPath {
        BoundaryPath::new(
            corners
                .iter()
                .map(|&(x, y)| PathPoint { x, y, node: 0 })
                .collect(),
        )
    }

    // --- build_path_data ---

    #[test]
    fn build_path_data_empty_path() {
        assert_eq!(build_path_data(&TracedPath::new(vec![])), "");
    }

    #[test]
    fn build_path_data_lines() {
        let d = build_path_data(&triangle());
        assert!(d.starts_with("M10,20 L30,20 L10,40 L10,20"), "{d}");
        assert!(d.to_lowercase().ends_with('z'), "{d}");
    }

    #[test]
    fn build_path_data_quad() {
        let path = TracedPath::new(vec![
            Segment::Quad {
                start: Point::new(0.0, 4.0),
                control: Point::new(4.0, 0.0),
                end: Point::new(8.0, 4.0),
            },
            line(8.0, 4.0, 0.0, 4.0),
        ]);
        let d = build_path_data(&path);
        assert!(d.starts_with("M0,4 Q4,0"), "{d}");
        assert!(d.contains("L0,4"), "{d}");
    }

    #[test]
    fn build_path_data_single_degenerate_line() {
        let path = TracedPath::new(vec![line(2.0, 3.0, 2.0, 3.0)]);
        assert!(build_path_data(&path).starts_with("M2,3 L2,3"));
    }

    // --- Empty / degenerate inputs ---

    #[test]
    fn no_drawables_produces_valid_svg_with_no_paths() {
        let svg = to_svg(&[], dims(100, 50), &no_meta());
        assert!(svg.contains(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"width="100""#));
        assert!(svg.contains(r#"height="50""#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(!svg.contains("<path"));
        // Empty SVGs use self-closing <svg .../> tag
        assert!(svg.contains("<svg "));
        assert!(svg.trim_end().ends_with("/>"));
    }

    #[test]
    fn empty_drawable_is_skipped() {
        let drawables = vec![drawable(1, TracedPath::new(vec![]))];
        let svg = to_svg(&drawables, dims(100, 100), &no_meta());
        assert!(!svg.contains("<path"));
    }

    // --- Basic output structure ---

    #[test]
    fn drawable_carries_region_style() {
        let svg = to_svg(&[drawable(1, triangle())], dims(800, 600), &no_meta());
        assert!(svg.contains(r#"viewBox="0 0 800 600""#));
        assert!(svg.contains(r#"fill="rgb(0,0,0)""#));
        assert!(svg.contains(r#"stroke="rgb(255,255,255)""#));
        assert!(svg.contains(r#"stroke-width="1""#));
        assert!(svg.contains(r#"opacity="1""#));
    }

    #[test]
    fn custom_style_is_written() {
        let mut d = drawable(0, triangle());
        d.style = PathStyle {
            fill: Color::opaque(10, 20, 30),
            stroke: Color::opaque(1, 2, 3),
            opacity: 0.5,
        };
        let svg = to_svg(&[d], dims(50, 50), &no_meta());
        assert!(svg.contains(r#"fill="rgb(10,20,30)""#));
        assert!(svg.contains(r#"stroke="rgb(1,2,3)""#));
        assert!(svg.contains(r#"opacity="0.5""#));
    }

    #[test]
    fn paths_follow_drawable_order() {
        let second = TracedPath::new(vec![
            line(1.0, 1.0, 2.0, 1.0),
            line(2.0, 1.0, 1.0, 1.0),
        ]);
        let svg = to_svg(
            &[drawable(0, triangle()), drawable(1, second)],
            dims(50, 50),
            &no_meta(),
        );
        assert_eq!(svg.matches("<path").count(), 2);
        let first_pos = svg.find("M10,20").unwrap();
        let second_pos = svg.find("M1,1").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn svg_has_xmlns_namespace() {
        let svg = to_svg(&[], dims(10, 10), &no_meta());
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
    }

    #[test]
    fn svg_ends_with_closing_tag() {
        let svg = to_svg(&[drawable(0, triangle())], dims(50, 50), &no_meta());
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    // --- Metadata ---

    #[test]
    fn title_and_desc_both_emitted() {
        let meta = SvgMetadata {
            title: Some("disc"),
            description: Some("threshold=20"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&[], dims(10, 10), &meta);
        assert!(svg.contains("<title>disc</title>"));
        assert!(svg.contains("<desc>threshold=20</desc>"));
    }

    #[test]
    fn title_and_desc_omitted_when_none() {
        let svg = to_svg(&[drawable(0, triangle())], dims(10, 10), &no_meta());
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<desc>"));
        assert!(!svg.contains("<metadata>"));
    }

    #[test]
    fn title_appears_before_paths() {
        let meta = SvgMetadata {
            title: Some("ordered"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&[drawable(0, triangle())], dims(50, 50), &meta);
        let title_pos = svg.find("<title>").unwrap();
        let path_pos = svg.find("<path").unwrap();
        assert!(title_pos < path_pos);
    }

    #[test]
    fn special_characters_in_title_are_escaped() {
        let meta = SvgMetadata {
            title: Some("a<b>&c"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&[], dims(10, 10), &meta);
        assert!(svg.contains("a&lt;b&gt;&amp;c"));
        assert!(!svg.contains("a<b>&c"));
    }

    #[test]
    fn metadata_appears_after_desc_and_before_paths() {
        let meta = SvgMetadata {
            title: None,
            description: Some("desc"),
            config_json: Some(r#"{"threshold":20}"#),
        };
        let svg = to_svg(&[drawable(0, triangle())], dims(50, 50), &meta);
        let desc_pos = svg.find("<desc>").unwrap();
        let meta_pos = svg.find("<metadata>").unwrap();
        let path_pos = svg.find("<path").unwrap();
        assert!(desc_pos < meta_pos);
        assert!(meta_pos < path_pos);
        assert!(svg.contains(PIPELINE_NAMESPACE));
        assert!(svg.contains("<vectrace:pipeline"));
    }

    // --- xml_escape ---

    #[test]
    fn xml_escape_handles_all_special_chars() {
        assert_eq!(xml_escape(r#"&<>"'"#), "&amp;&lt;&gt;&quot;&apos;");
    }

    #[test]
    fn xml_escape_passes_through_plain_text() {
        assert_eq!(xml_escape("hello world"), "hello world");
    }

    // --- Boundary diagnostic SVG ---

    #[test]
    fn boundary_svg_overlays_polygons() {
        let boundaries = vec![
            Vec::new(),
            vec![boundary(&[(1, 1), (2, 1), (2, 2), (1, 2)])],
        ];
        let svg = to_boundary_svg(
            &[drawable(1, triangle())],
            &boundaries,
            dims(4, 4),
            &no_meta(),
        );
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"viewBox="0 0 4 4""#));
        assert!(svg.contains("fill=\"#1a1a1a\""));
        assert!(svg.contains(r#"<g id="outlines""#));
        assert!(svg.contains(r#"<g id="boundaries""#));
        assert!(svg.contains(
            r#"<polygon points="1,1 2,1 2,2 1,2" data-region="1" data-path="0" data-points="4"/>"#
        ));
        assert!(svg.contains("boundary polygons: 1 total"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn boundary_svg_without_polygons_omits_group() {
        let svg = to_boundary_svg(&[], &[Vec::new(), Vec::new()], dims(4, 4), &no_meta());
        assert!(!svg.contains(r#"<g id="boundaries""#));
        assert!(svg.contains(r#"<g id="outlines""#));
    }

    #[test]
    fn boundary_svg_escapes_metadata() {
        let meta = SvgMetadata {
            title: Some("x & y"),
            description: Some("<desc>"),
            config_json: Some(r#"{"a":"<b>"}"#),
        };
        let svg = to_boundary_svg(&[], &[], dims(4, 4), &meta);
        assert!(svg.contains("<title>x &amp; y</title>"));
        assert!(svg.contains("<desc>&lt;desc&gt;</desc>"));
        assert!(svg.contains("&quot;a&quot;:&quot;&lt;b&gt;&quot;"));
    }
}
