//! Boundary walking over an edge-node grid.
//!
//! The walker raster-scans for a corner carrying a boundary code
//! (1 to 14), then follows the boundary one corner at a time. Each step
//! looks up `(code, heading)` in [`TRANSITIONS`], overwrites the cell
//! with the entry's replacement code, turns and moves. A full walk
//! clears every corner it crosses, so a boundary is emitted once.
//!
//! Saddle corners (5 and 10) sit on two boundaries. The first walk
//! through one leaves the code of the unvisited half behind (13/7 for
//! 5, 11/14 for 10) and a later walk consumes the rest.
//!
//! Headings: 0 east, 1 north, 2 west, 3 south.

use crate::types::{BoundaryPath, EdgeNodeGrid, PathPoint, PipelineError};

/// One `(code, heading)` entry of the walk table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    /// Code written back into the cell after leaving it.
    replacement: u8,
    /// Heading after the turn.
    heading: u8,
    dx: i8,
    dy: i8,
}

const fn t(replacement: u8, heading: u8, dx: i8, dy: i8) -> Option<Transition> {
    Some(Transition {
        replacement,
        heading,
        dx,
        dy,
    })
}

const X: Option<Transition> = None;

/// Initial heading for a walk starting on each code.
const START_HEADING: [u8; 16] = [0, 0, 3, 0, 1, 0, 3, 0, 0, 3, 3, 1, 0, 3, 0, 0];

/// Codes whose walk traces the inside of a hole in the region.
const HOLE: [bool; 16] = [
    false, false, false, false, false, false, false, true, false, false, false, true, false,
    true, true, false,
];

/// `TRANSITIONS[code][heading]`; `None` marks a state a well-formed grid
/// never reaches.
#[rustfmt::skip]
static TRANSITIONS: [[Option<Transition>; 4]; 16] = [
    [X, X, X, X],
    [t(0, 1, 0, -1), X, X, t(0, 2, -1, 0)],
    [X, X, t(0, 1, 0, -1), t(0, 0, 1, 0)],
    [t(0, 0, 1, 0), X, t(0, 2, -1, 0), X],
    [X, t(0, 0, 1, 0), t(0, 3, 0, 1), X],
    [t(13, 3, 0, 1), t(13, 2, -1, 0), t(7, 1, 0, -1), t(7, 0, 1, 0)],
    [X, t(0, 1, 0, -1), X, t(0, 3, 0, 1)],
    [t(0, 3, 0, 1), t(0, 2, -1, 0), X, X],
    [t(0, 3, 0, 1), t(0, 2, -1, 0), X, X],
    [X, t(0, 1, 0, -1), X, t(0, 3, 0, 1)],
    [t(11, 1, 0, -1), t(14, 0, 1, 0), t(14, 3, 0, 1), t(11, 2, -1, 0)],
    [X, t(0, 0, 1, 0), t(0, 3, 0, 1), X],
    [t(0, 0, 1, 0), X, t(0, 2, -1, 0), X],
    [X, X, t(0, 1, 0, -1), t(0, 0, 1, 0)],
    [t(0, 1, 0, -1), X, X, t(0, 2, -1, 0)],
    [X, X, X, X],
];

/// Upper bound on steps per grid cell before a walk is declared
/// runaway. Every corner is entered at most twice (saddles) and a
/// well-formed grid never needs more.
const MAX_STEPS_PER_CELL: usize = 4;

/// Outcome of walking one edge-node grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanOutcome {
    /// Kept boundary paths, in discovery order.
    pub paths: Vec<BoundaryPath>,
    /// Walks discarded because they traced a hole.
    pub holes_discarded: usize,
    /// Walks discarded for being shorter than the minimum length.
    pub short_discarded: usize,
}

/// Walk every boundary in `grid` and return the kept paths.
///
/// The grid is consumed: every walked corner is overwritten.
///
/// # Errors
///
/// Returns [`PipelineError::CorruptTraceState`] if the walk reaches a
/// `(code, heading)` pair with no transition, leaves the grid, or runs
/// longer than a well-formed grid allows.
pub fn scan(
    grid: EdgeNodeGrid,
    min_path_len: usize,
) -> Result<Vec<BoundaryPath>, PipelineError> {
    scan_counted(grid, min_path_len).map(|outcome| outcome.paths)
}

/// Like [`scan`], also reporting how many walks were discarded.
///
/// # Errors
///
/// See [`scan`].
pub fn scan_counted(
    mut grid: EdgeNodeGrid,
    min_path_len: usize,
) -> Result<ScanOutcome, PipelineError> {
    let mut outcome = ScanOutcome::default();
    let step_limit = grid
        .width()
        .saturating_mul(grid.height())
        .saturating_mul(MAX_STEPS_PER_CELL);

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let code = grid.get(x, y);
            if code == 0 || code == 15 {
                continue;
            }

            let start = usize::from(code);
            let hole = HOLE.get(start).copied().ok_or_else(|| corrupt(x, y, code, None))?;
            let heading = START_HEADING[start];
            let points = walk(&mut grid, x, y, heading, step_limit)?;

            if hole {
                outcome.holes_discarded += 1;
            } else if points.len() < min_path_len {
                outcome.short_discarded += 1;
            } else {
                outcome.paths.push(BoundaryPath::new(points));
            }
        }
    }

    Ok(outcome)
}

/// Follow one boundary from `(x, y)` until it returns to its start.
fn walk(
    grid: &mut EdgeNodeGrid,
    start_x: usize,
    start_y: usize,
    mut heading: u8,
    step_limit: usize,
) -> Result<Vec<PathPoint>, PipelineError> {
    let (mut x, mut y) = (start_x, start_y);
    let mut points = Vec::new();

    loop {
        if points.len() >= step_limit {
            return Err(PipelineError::CorruptTraceState {
                x,
                y,
                reason: format!("walk exceeded {step_limit} steps without closing"),
            });
        }

        let code = grid.get(x, y);
        let transition = TRANSITIONS
            .get(usize::from(code))
            .and_then(|row| row[usize::from(heading)])
            .ok_or_else(|| corrupt(x, y, code, Some(heading)))?;

        points.push(PathPoint {
            x: padded_to_image(x),
            y: padded_to_image(y),
            node: code,
        });

        grid.set(x, y, transition.replacement);
        heading = transition.heading;

        let next = x
            .checked_add_signed(isize::from(transition.dx))
            .zip(y.checked_add_signed(isize::from(transition.dy)))
            .filter(|&(nx, ny)| nx < grid.width() && ny < grid.height());
        let Some((nx, ny)) = next else {
            return Err(PipelineError::CorruptTraceState {
                x,
                y,
                reason: "walk left the grid".to_string(),
            });
        };
        (x, y) = (nx, ny);

        if x == start_x && y == start_y {
            return Ok(points);
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn padded_to_image(coord: usize) -> i32 {
    coord as i32 - 1
}

fn corrupt(x: usize, y: usize, code: u8, heading: Option<u8>) -> PipelineError {
    let reason = heading.map_or_else(
        || format!("node code {code} is out of range"),
        |heading| format!("no transition for node code {code} heading {heading}"),
    );
    PipelineError::CorruptTraceState { x, y, reason }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layer::build_layers;
    use crate::quantize::BORDER;
    use crate::types::RegionGrid;

    fn regions(rows: &[&[i32]]) -> RegionGrid {
        let height = rows.len();
        let width = rows[0].len();
        let mut grid = RegionGrid::filled(width + 2, height + 2, BORDER);
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                grid.set(x + 1, y + 1, v);
            }
        }
        grid
    }

    fn layer(rows: &[&[i32]], region: usize) -> EdgeNodeGrid {
        build_layers(&regions(rows), 2).swap_remove(region)
    }

    fn corners(path: &BoundaryPath) -> Vec<(i32, i32)> {
        path.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn single_pixel_is_a_four_corner_loop() {
        let rows: &[&[i32]] = &[&[0, 0, 0, 0], &[0, 1, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]];
        let paths = scan(layer(rows, 1), 1).unwrap();
        assert_eq!(paths.len(), 1);
        let nodes: Vec<_> = paths[0].iter().map(|p| (p.x, p.y, p.node)).collect();
        assert_eq!(nodes, vec![(1, 1, 4), (2, 1, 8), (2, 2, 1), (1, 2, 2)]);
    }

    #[test]
    fn white_around_pixel_keeps_frame_and_drops_hole() {
        let rows: &[&[i32]] = &[&[0, 0, 0, 0], &[0, 1, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]];
        let outcome = scan_counted(layer(rows, 0), 1).unwrap();
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(outcome.paths[0].len(), 16);
        assert_eq!(outcome.holes_discarded, 1);
        assert_eq!(outcome.short_discarded, 0);
    }

    #[test]
    fn uniform_image_frame_walks_the_perimeter() {
        let rows: &[&[i32]] = &[&[0; 4], &[0; 4], &[0; 4], &[0; 4]];
        let paths = scan(layer(rows, 0), 1).unwrap();
        assert_eq!(paths.len(), 1);
        let pts = corners(&paths[0]);
        assert_eq!(pts.len(), 16);
        assert_eq!(pts[0], (0, 0));
        assert_eq!(pts[4], (4, 0));
        assert_eq!(pts[8], (4, 4));
        assert_eq!(pts[12], (0, 4));
        assert!(scan(layer(rows, 1), 1).unwrap().is_empty());
    }

    #[test]
    fn paths_are_closed_rectilinear_loops() {
        let rows: &[&[i32]] = &[
            &[0, 1, 1, 0, 1, 0],
            &[1, 0, 1, 1, 0, 0],
            &[1, 1, 0, 0, 0, 1],
            &[0, 1, 0, 1, 1, 1],
        ];
        for region in 0..2 {
            for path in scan(layer(rows, region), 1).unwrap() {
                let pts = corners(&path);
                for (i, &(x, y)) in pts.iter().enumerate() {
                    let (nx, ny) = pts[(i + 1) % pts.len()];
                    assert_eq!((x - nx).abs() + (y - ny).abs(), 1, "step {i} of {pts:?}");
                }
            }
        }
    }

    #[test]
    fn saddle_corners_are_walked_twice() {
        let rows: &[&[i32]] = &[&[1, 0, 1], &[0, 1, 0], &[1, 0, 1]];
        let grid = layer(rows, 1);
        let total = crate::layer::boundary_node_count(&grid);
        let saddles = grid.cells().iter().filter(|&&c| c == 5 || c == 10).count();
        assert_eq!(saddles, 4);

        let outcome = scan_counted(grid, 1).unwrap();
        assert_eq!(outcome.holes_discarded, 0);
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(outcome.paths[0].len(), total + saddles);
    }

    #[test]
    fn min_path_len_discards_short_walks() {
        let rows: &[&[i32]] = &[&[0, 0, 0], &[0, 1, 0], &[0, 0, 0]];
        let outcome = scan_counted(layer(rows, 1), 5).unwrap();
        assert!(outcome.paths.is_empty());
        assert_eq!(outcome.short_discarded, 1);
    }

    #[test]
    fn missing_transition_is_corrupt() {
        // Code 2 starts heading south and turns east onto a code-4
        // corner, which has no entry for an eastward heading.
        let mut grid = EdgeNodeGrid::filled(4, 3, 0);
        grid.set(1, 1, 2);
        grid.set(2, 1, 4);
        let err = scan(grid, 1).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CorruptTraceState { x: 2, y: 1, .. }
        ));
    }

    #[test]
    fn walk_off_the_grid_is_corrupt() {
        // A lone code 3 at the right edge walks east out of bounds.
        let mut grid = EdgeNodeGrid::filled(2, 2, 0);
        grid.set(1, 0, 3);
        let err = scan(grid, 1).unwrap_err();
        assert!(matches!(err, PipelineError::CorruptTraceState { .. }));
    }

    #[test]
    fn walk_past_step_limit_is_corrupt() {
        // A single pixel closes after four steps; allow only three.
        let rows: &[&[i32]] = &[&[0, 0, 0], &[0, 1, 0], &[0, 0, 0]];
        let mut grid = layer(rows, 1);
        assert_eq!(grid.get(2, 2), 4);
        let err = walk(&mut grid, 2, 2, START_HEADING[4], 3).unwrap_err();
        assert!(
            matches!(
                &err,
                PipelineError::CorruptTraceState { x: 2, y: 3, reason }
                    if reason.contains("exceeded 3 steps")
            ),
            "{err:?}"
        );
    }

    #[test]
    fn step_limit_admits_a_full_walk() {
        let rows: &[&[i32]] = &[&[0, 0, 0], &[0, 1, 0], &[0, 0, 0]];
        let mut grid = layer(rows, 1);
        let points = walk(&mut grid, 2, 2, START_HEADING[4], 4).unwrap();
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn out_of_range_code_is_corrupt() {
        let mut grid = EdgeNodeGrid::filled(3, 3, 0);
        grid.set(1, 1, 200);
        assert!(matches!(
            scan(grid, 1),
            Err(PipelineError::CorruptTraceState { x: 1, y: 1, .. })
        ));
    }
}
