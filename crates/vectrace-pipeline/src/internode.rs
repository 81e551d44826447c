//! Internode interpolation.
//!
//! Boundary corners form staircases. Replacing each corner with the
//! midpoint of the edge leaving it gives a path whose consecutive
//! points differ by half-pixel steps in both axes along diagonals,
//! which the curve fitter can approximate far better than the raw
//! stair corners.

use crate::types::{BoundaryPath, Direction, InterpolatedPath, Internode, Point};

/// Convert a boundary polygon into its internode path.
///
/// Internode `k` is the midpoint of corners `k` and `k + 1` (cyclic).
/// Its direction is the bearing to internode `k + 1`.
#[must_use]
pub fn interpolate(path: &BoundaryPath) -> InterpolatedPath {
    let corners = path.as_slice();
    let n = corners.len();
    let midpoint = |k: usize| {
        corners[k % n]
            .position()
            .midpoint(corners[(k + 1) % n].position())
    };

    let internodes = (0..n)
        .map(|k| {
            let here = midpoint(k);
            let next = midpoint(k + 1);
            Internode {
                point: here,
                direction: classify(here, next),
            }
        })
        .collect();

    InterpolatedPath::new(internodes)
}

/// Eight-way bearing from `from` to `to`, comparing each axis strictly.
#[must_use]
pub fn classify(from: Point, to: Point) -> Direction {
    use std::cmp::Ordering::{Equal, Greater, Less};

    let horizontal = from.x.partial_cmp(&to.x).unwrap_or(Equal);
    let vertical = from.y.partial_cmp(&to.y).unwrap_or(Equal);

    // Image rows grow downwards, so `from.y < to.y` heads south.
    match (horizontal, vertical) {
        (Less, Less) => Direction::SouthEast,
        (Less, Greater) => Direction::NorthEast,
        (Less, Equal) => Direction::East,
        (Greater, Less) => Direction::SouthWest,
        (Greater, Greater) => Direction::NorthWest,
        (Greater, Equal) => Direction::West,
        (Equal, Less) => Direction::South,
        (Equal, Greater) => Direction::North,
        (Equal, Equal) => Direction::Center,
    }
}
