//! Edge-node classification (marching squares over region membership).
//!
//! Every grid corner gets a 4-bit code describing which of its four
//! surrounding pixels belong to the region:
//!
//! ```text
//!   1 | 2
//!   --+--
//!   8 | 4
//! ```
//!
//! Code 0 (no member) and 15 (all members) carry no boundary. Codes
//! 5 and 10 are the two saddle configurations.
//!
//! Corner `(x, y)` of the padded grid sits at the top-left of padded
//! pixel `(x, y)`. Each pixel writes its own bottom-right corner and
//! fills in its other three corners only when no earlier-visited
//! same-region neighbor owns them, so the final code is the same for
//! any visiting order.

use crate::types::{EdgeNodeGrid, RegionGrid};

/// Build one edge-node grid per region index in `0..region_count`.
///
/// The returned grids share the padded dimensions of `regions`. Cells
/// holding a region outside `0..region_count` (including the padding)
/// contribute nothing.
#[must_use = "returns one edge-node grid per region"]
pub fn build_layers(regions: &RegionGrid, region_count: usize) -> Vec<EdgeNodeGrid> {
    let width = regions.width();
    let height = regions.height();
    let mut layers = vec![EdgeNodeGrid::filled(width, height, 0); region_count];

    if width < 3 || height < 3 {
        return layers;
    }

    for j in 1..height - 1 {
        for i in 1..width - 1 {
            let value = regions.get(i, j);
            let Some(layer) = usize::try_from(value)
                .ok()
                .and_then(|index| layers.get_mut(index))
            else {
                continue;
            };

            let same = |x: usize, y: usize| u8::from(regions.get(x, y) == value);
            let n1 = same(i - 1, j - 1);
            let n2 = same(i, j - 1);
            let n3 = same(i + 1, j - 1);
            let n4 = same(i - 1, j);
            let n5 = same(i + 1, j);
            let n6 = same(i - 1, j + 1);
            let n7 = same(i, j + 1);
            let n8 = same(i + 1, j + 1);

            layer.set(i + 1, j + 1, 1 + n5 * 2 + n8 * 4 + n7 * 8);
            if n4 == 0 {
                layer.set(i, j + 1, 2 + n7 * 4 + n6 * 8);
            }
            if n2 == 0 {
                layer.set(i + 1, j, n3 * 2 + n5 * 4 + 8);
            }
            if n1 == 0 {
                layer.set(i, j, n2 * 2 + 4 + n4 * 8);
            }
        }
    }

    layers
}

/// Number of corners in `layer` that lie on a boundary (codes 1 to 14).
#[must_use]
pub fn boundary_node_count(layer: &EdgeNodeGrid) -> usize {
    layer
        .cells()
        .iter()
        .filter(|&&code| code != 0 && code != 15)
        .count()
}
