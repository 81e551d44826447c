//! vectrace-export: Pure format serializers (sans-IO)
//!
//! Converts composed drawables into output formats. Currently supports
//! SVG, plus a diagnostic SVG that overlays the raw boundary polygons.

pub mod svg;

pub use svg::{SvgMetadata, build_path_data, to_boundary_svg, to_svg};
