//! Recursive line / quadratic-curve fitting over internode paths.
//!
//! A closed internode path is first cut into runs whose directions use
//! at most two distinct compass codes. Each run is then fitted:
//!
//! 1. Try a straight line from the run's first to last internode,
//!    parametrized by index so internode `k` of `n` maps to `k / n`
//!    along the chord.
//! 2. If that fails, try a quadratic Bezier forced through the worst
//!    internode of the line fit at its own parameter.
//! 3. If that fails too, split halfway between the two worst
//!    internodes and fit each half recursively.
//!
//! Indices are cyclic, so a run may wrap past the end of the path.
//! Tolerances compare squared distances.

use crate::types::{InterpolatedPath, Internode, Point, Segment, TracedPath};

/// Fit a closed internode path with lines and quadratic curves.
///
/// The returned segments chain end-to-start, including from the last
/// segment back to the first. An empty input yields an empty path; a
/// single internode yields one zero-length line.
#[must_use = "returns the fitted path"]
pub fn trace_path(
    path: &InterpolatedPath,
    line_tolerance: f64,
    quad_tolerance: f64,
) -> TracedPath {
    let nodes = path.as_slice();
    let n = nodes.len();
    if n == 0 {
        return TracedPath::new(Vec::new());
    }
    if n == 1 {
        return TracedPath::new(fit_sequence(path, line_tolerance, quad_tolerance, 0, 0));
    }

    let mut segments = Vec::new();
    let mut start = 0;
    while start < n {
        let end = run_end(nodes, start);
        fit_range(nodes, line_tolerance, quad_tolerance, start, end, &mut segments);
        start = if end > 0 { end } else { n };
    }

    TracedPath::new(segments)
}

/// Fit every path of one region.
#[must_use = "returns the fitted paths"]
pub fn trace_paths(
    paths: &[InterpolatedPath],
    line_tolerance: f64,
    quad_tolerance: f64,
) -> Vec<TracedPath> {
    paths
        .iter()
        .map(|p| trace_path(p, line_tolerance, quad_tolerance))
        .collect()
}

/// Fit the cyclic index range `start..=end` of `path`.
///
/// `end` may be smaller than `start` (the range wraps). `start == end`
/// covers the whole closed path. Out-of-range indices produce no
/// segments.
#[must_use = "returns the fitted segments"]
pub fn fit_sequence(
    path: &InterpolatedPath,
    line_tolerance: f64,
    quad_tolerance: f64,
    start: usize,
    end: usize,
) -> Vec<Segment> {
    let nodes = path.as_slice();
    let mut segments = Vec::new();
    if start < nodes.len() && end < nodes.len() {
        fit_range(
            nodes,
            line_tolerance,
            quad_tolerance,
            start,
            end,
            &mut segments,
        );
    }
    segments
}

/// End index of the direction run beginning at `start`.
///
/// A run keeps going while it has seen at most two distinct directions.
/// A run that reaches the last index closes the path and ends at 0.
fn run_end(nodes: &[Internode], start: usize) -> usize {
    let last = nodes.len() - 1;
    let first = nodes[start].direction;
    let mut second = None;
    let mut end = start + 1;

    while end < last {
        let direction = nodes[end].direction;
        if direction != first && second != Some(direction) {
            if second.is_some() {
                break;
            }
            second = Some(direction);
        }
        end += 1;
    }

    if end == last { 0 } else { end }
}

#[allow(clippy::cast_precision_loss)]
fn fit_range(
    nodes: &[Internode],
    line_tolerance: f64,
    quad_tolerance: f64,
    start: usize,
    end: usize,
    out: &mut Vec<Segment>,
) {
    let line_tolerance = line_tolerance.max(0.0);
    let quad_tolerance = quad_tolerance.max(0.0);
    let n = nodes.len();
    let p0 = nodes[start].point;
    let p2 = nodes[end].point;

    if n == 1 {
        out.push(Segment::Line { start: p0, end: p0 });
        return;
    }

    let span = match (end + n - start) % n {
        0 => n,
        s => s,
    };
    let at = |offset: usize| nodes[(start + offset) % n].point;

    // Straight line, parametrized by index offset.
    let step = Point::new((p2.x - p0.x) / span as f64, (p2.y - p0.y) / span as f64);
    let mut worst_offset = 0;
    let mut worst = 0.0;
    let mut fits = true;
    for offset in 1..span {
        let o = offset as f64;
        let expected = Point::new(step.x.mul_add(o, p0.x), step.y.mul_add(o, p0.y));
        let deviation = at(offset).distance_squared(expected);
        if deviation > line_tolerance {
            fits = false;
        }
        if deviation > worst {
            worst = deviation;
            worst_offset = offset;
        }
    }
    if fits {
        out.push(Segment::Line { start: p0, end: p2 });
        return;
    }

    // Quadratic through the worst internode of the line fit.
    let fit_offset = worst_offset;
    let control = control_point(p0, at(fit_offset), p2, fit_offset as f64 / span as f64);
    worst = 0.0;
    fits = true;
    for offset in 1..span {
        let t = offset as f64 / span as f64;
        let deviation = at(offset).distance_squared(quad_point(p0, control, p2, t));
        if deviation > quad_tolerance {
            fits = false;
        }
        if deviation > worst {
            worst = deviation;
            worst_offset = offset;
        }
    }
    if fits {
        out.push(Segment::Quad {
            start: p0,
            control,
            end: p2,
        });
        return;
    }

    // Both offsets lie in 1..span, so the split is strictly interior.
    let split = (start + (fit_offset + worst_offset) / 2) % n;
    fit_range(nodes, line_tolerance, quad_tolerance, start, split, out);
    fit_range(nodes, line_tolerance, quad_tolerance, split, end, out);
}

/// Control point of the quadratic from `p0` to `p2` that passes through
/// `through` at parameter `t` (strictly between 0 and 1).
fn control_point(p0: Point, through: Point, p2: Point, t: f64) -> Point {
    let a = (1.0 - t) * (1.0 - t);
    let b = 2.0 * (1.0 - t) * t;
    let c = t * t;
    Point::new(
        c.mul_add(-p2.x, a.mul_add(-p0.x, through.x)) / b,
        c.mul_add(-p2.y, a.mul_add(-p0.y, through.y)) / b,
    )
}

/// Quadratic Bezier evaluated at `t`.
fn quad_point(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let a = (1.0 - t) * (1.0 - t);
    let b = 2.0 * (1.0 - t) * t;
    let c = t * t;
    Point::new(
        a.mul_add(p0.x, b.mul_add(p1.x, c * p2.x)),
        a.mul_add(p0.y, b.mul_add(p1.y, c * p2.y)),
    )
}
