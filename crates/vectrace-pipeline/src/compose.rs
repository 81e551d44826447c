//! Composition: order fitted paths for drawing and attach region styles.
//!
//! Paths are drawn in order of their start point linearized over the
//! padded grid (`y * stride + x`), so outlines appear top to bottom,
//! left to right. This module defines the [`ZOrder`] trait for the
//! ordering strategies and the [`ZOrderKind`] enum for runtime
//! selection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Color, TracedPath};

/// Selects how fitted paths are ordered for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZOrderKind {
    /// Ascending start-point key, ties broken by region and then by
    /// path index. Every path is kept.
    #[default]
    Stable,

    /// Single entry per start-point key; among paths sharing a key the
    /// last one processed (highest region, then highest path index)
    /// wins and the others are dropped.
    ///
    /// Matches tracers that collect paths in a key-indexed map.
    LastWins,
}

impl fmt::Display for ZOrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => f.write_str("stable"),
            Self::LastWins => f.write_str("last-wins"),
        }
    }
}

/// Trait for draw-order strategies.
///
/// Input: unordered drawables with their keys assigned.
/// Output: the drawables in painting order.
pub trait ZOrder {
    /// Put `drawables` into painting order, possibly dropping some.
    fn order(&self, drawables: Vec<Drawable>) -> Vec<Drawable>;
}

impl ZOrder for ZOrderKind {
    fn order(&self, drawables: Vec<Drawable>) -> Vec<Drawable> {
        match *self {
            Self::Stable => order_stable(drawables),
            Self::LastWins => order_last_wins(drawables),
        }
    }
}

/// Fill, stroke and opacity of a drawn path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub fill: Color,
    pub stroke: Color,
    pub opacity: f64,
}

/// Style for paths of `region`.
///
/// Region 0 is the light background: white fill, black stroke. Every
/// other region is drawn black with a white stroke.
#[must_use]
pub const fn style_for(region: usize) -> PathStyle {
    if region == 0 {
        PathStyle {
            fill: Color::WHITE,
            stroke: Color::BLACK,
            opacity: 1.0,
        }
    } else {
        PathStyle {
            fill: Color::BLACK,
            stroke: Color::WHITE,
            opacity: 1.0,
        }
    }
}

/// One styled, ordered, closed path ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    /// Region the path outlines.
    pub region: usize,
    /// Index of the path within its region.
    pub path_index: usize,
    /// Linearized start point, `y * stride + x`.
    pub order_key: f64,
    pub style: PathStyle,
    pub path: TracedPath,
}

/// Build the ordered drawable list from per-region fitted paths.
///
/// `traced[k][p]` is path `p` of region `k`. `stride` is the padded
/// grid width (image width + 2). Empty paths are skipped.
#[must_use = "returns the ordered drawables"]
pub fn compose(
    traced: &[Vec<TracedPath>],
    stride: usize,
    z_order: ZOrderKind,
) -> Vec<Drawable> {
    let drawables = traced
        .iter()
        .enumerate()
        .flat_map(|(region, paths)| {
            paths.iter().enumerate().filter_map(move |(path_index, path)| {
                let start = path.start_point()?;
                Some(Drawable {
                    region,
                    path_index,
                    order_key: order_key(start.x, start.y, stride),
                    style: style_for(region),
                    path: path.clone(),
                })
            })
        })
        .collect();

    z_order.order(drawables)
}

#[allow(clippy::cast_precision_loss)]
fn order_key(x: f64, y: f64, stride: usize) -> f64 {
    y.mul_add(stride as f64, x)
}

fn compare(a: &Drawable, b: &Drawable) -> std::cmp::Ordering {
    a.order_key
        .total_cmp(&b.order_key)
        .then(a.region.cmp(&b.region))
        .then(a.path_index.cmp(&b.path_index))
}

fn order_stable(mut drawables: Vec<Drawable>) -> Vec<Drawable> {
    drawables.sort_by(compare);
    drawables
}

fn order_last_wins(drawables: Vec<Drawable>) -> Vec<Drawable> {
    // After sorting, the last of each equal-key run is the one a keyed
    // map would have kept.
    let mut kept: Vec<Drawable> = Vec::with_capacity(drawables.len());
    for drawable in order_stable(drawables) {
        match kept.last_mut() {
            Some(prev) if prev.order_key.total_cmp(&drawable.order_key).is_eq() => {
                *prev = drawable;
            }
            _ => kept.push(drawable),
        }
    }
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Point, Segment};

    fn triangle_at(x: f64, y: f64) -> TracedPath {
        let a = Point::new(x, y);
        let b = Point::new(x + 1.0, y);
        let c = Point::new(x, y + 1.0);
        TracedPath::new(vec![
            Segment::Line { start: a, end: b },
            Segment::Line { start: b, end: c },
            Segment::Line { start: c, end: a },
        ])
    }

    fn ids(drawables: &[Drawable]) -> Vec<(usize, usize)> {
        drawables.iter().map(|d| (d.region, d.path_index)).collect()
    }

    #[test]
    fn default_is_stable() {
        assert_eq!(ZOrderKind::default(), ZOrderKind::Stable);
    }

    #[test]
    fn display_names() {
        assert_eq!(ZOrderKind::Stable.to_string(), "stable");
        assert_eq!(ZOrderKind::LastWins.to_string(), "last-wins");
    }

    #[test]
    fn orders_by_linearized_start() {
        let traced = vec![
            vec![triangle_at(0.5, 3.0), triangle_at(2.0, 0.5)],
            vec![triangle_at(1.5, 1.0)],
        ];
        let drawables = compose(&traced, 6, ZOrderKind::Stable);
        // Keys: 18.5, 5.0, 7.5.
        assert_eq!(ids(&drawables), vec![(0, 1), (1, 0), (0, 0)]);
        assert!((drawables[0].order_key - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_keys_keep_every_path() {
        let traced = vec![
            vec![triangle_at(1.5, 1.0)],
            vec![triangle_at(1.5, 1.0), triangle_at(1.5, 1.0)],
        ];
        let drawables = compose(&traced, 6, ZOrderKind::Stable);
        assert_eq!(ids(&drawables), vec![(0, 0), (1, 0), (1, 1)]);
    }

    #[test]
    fn last_wins_drops_earlier_equal_keys() {
        let traced = vec![
            vec![triangle_at(1.5, 1.0), triangle_at(0.0, 0.5)],
            vec![triangle_at(1.5, 1.0)],
        ];
        let drawables = compose(&traced, 6, ZOrderKind::LastWins);
        assert_eq!(ids(&drawables), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn styles_follow_region() {
        let traced = vec![vec![triangle_at(0.0, 0.0)], vec![triangle_at(1.0, 1.0)]];
        let drawables = compose(&traced, 4, ZOrderKind::Stable);
        assert_eq!(drawables[0].style.fill, Color::WHITE);
        assert_eq!(drawables[0].style.stroke, Color::BLACK);
        assert_eq!(drawables[1].style.fill, Color::BLACK);
        assert_eq!(drawables[1].style.stroke, Color::WHITE);
        assert!(drawables.iter().all(|d| (d.style.opacity - 1.0).abs() < f64::EPSILON));
        assert_eq!(style_for(7), style_for(1));
    }

    #[test]
    fn empty_paths_are_skipped() {
        let traced = vec![vec![TracedPath::new(Vec::new()), triangle_at(0.0, 0.0)]];
        let drawables = compose(&traced, 4, ZOrderKind::Stable);
        assert_eq!(ids(&drawables), vec![(0, 1)]);
    }

    #[test]
    fn z_order_kind_serde_round_trip() {
        for kind in [ZOrderKind::Stable, ZOrderKind::LastWins] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: ZOrderKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }
}
