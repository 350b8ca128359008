//! Suppression of markers lying inside a larger pore's inscribed sphere

use crate::spatial::grid::{Grid, Offset};
use crate::spatial::neighborhood::Neighborhood;
use hashbrown::HashMap;

/// A marker candidate with its smoothed distance value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    /// Linear index of the voxel
    pub index: usize,
    /// Smoothed distance at the voxel
    pub height: f64,
}

/// Rule deciding how far an accepted marker suppresses its neighbors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityRule {
    /// Suppression radius as a multiple of the accepted marker's height
    pub factor: f64,
    /// Absolute lower bound on the suppression radius, in voxels
    pub min_distance: f64,
}

impl ProximityRule {
    /// Radius within which a marker of the given height suppresses others
    pub fn radius(&self, height: f64) -> f64 {
        (self.factor * height).max(self.min_distance)
    }
}

/// Keep the highest candidates, dropping any within reach of a kept one
///
/// Candidates are visited by descending height, ties by ascending index.
/// A candidate is dropped when its distance to an already accepted marker is
/// strictly below that marker's suppression radius. Returns accepted
/// indices in ascending order.
pub fn trim_nearby_peaks(candidates: &[PeakCandidate], grid: &Grid, rule: ProximityRule) -> Vec<usize> {
    let mut order: Vec<PeakCandidate> = candidates.to_vec();
    order.sort_by(|a, b| b.height.total_cmp(&a.height).then(a.index.cmp(&b.index)));

    let cell_size = order
        .iter()
        .map(|c| rule.radius(c.height))
        .fold(1.0, f64::max);
    let adjacent_cells = Neighborhood::cube(grid.ndim(), 1);

    let mut buckets: HashMap<Offset, Vec<(usize, f64)>> = HashMap::new();
    let mut accepted = Vec::new();

    for candidate in order {
        let cell = cell_of(grid, candidate.index, cell_size);
        let suppressed = std::iter::once(cell.clone())
            .chain(adjacent_cells.offsets().iter().map(|offset| {
                cell.iter().zip(offset).map(|(&c, &d)| c + d).collect::<Offset>()
            }))
            .filter_map(|key| buckets.get(&key))
            .flatten()
            .any(|&(kept, radius)| grid.distance(kept, candidate.index) < radius);

        if !suppressed {
            buckets
                .entry(cell)
                .or_default()
                .push((candidate.index, rule.radius(candidate.height)));
            accepted.push(candidate.index);
        }
    }

    accepted.sort_unstable();
    accepted
}

fn cell_of(grid: &Grid, index: usize, cell_size: f64) -> Offset {
    (0..grid.ndim())
        .map(|axis| (grid.axis_position(index, axis) as f64 / cell_size).floor() as isize)
        .collect()
}
