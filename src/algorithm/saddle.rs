//! Plateau grouping and saddle-point trimming
//!
//! Raw maxima come in connected groups wherever the smoothed distance map is
//! flat at the top. Each group is tested by growing it outward: a real peak
//! stays the highest ground as the window widens, while a group sitting on a
//! ridge or saddle is overtaken by higher ground nearby.

use crate::spatial::grid::Grid;
use crate::spatial::neighborhood::Neighborhood;
use bitvec::prelude::*;
use hashbrown::HashSet;
use rayon::prelude::*;
use std::collections::VecDeque;

/// Connected group of candidate maxima
#[derive(Debug, Clone, PartialEq)]
pub struct Plateau {
    /// Member voxels, ascending
    pub voxels: Vec<usize>,
    /// Highest smoothed value among the members
    pub height: f64,
}

/// Outcome of the dilation test for one plateau
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakVerdict {
    /// The plateau is the unique top of its neighborhood
    TruePeak,
    /// Higher ground was found next to the plateau
    Saddle,
    /// No decision within the iteration budget; kept
    Undecided,
}

impl PeakVerdict {
    /// Whether the plateau survives trimming
    pub const fn is_kept(self) -> bool {
        !matches!(self, Self::Saddle)
    }
}

/// Group candidates into plateaus connected under `connectivity`
///
/// Plateaus are returned in order of their lowest voxel index.
pub fn group_plateaus(
    candidates: &[usize],
    values: &[f64],
    grid: &Grid,
    connectivity: &Neighborhood,
) -> Vec<Plateau> {
    let mut is_candidate = bitvec![0; grid.len()];
    for &index in candidates {
        is_candidate.set(index, true);
    }
    let mut visited = bitvec![0; grid.len()];
    let mut plateaus = Vec::new();

    for &start in candidates {
        if visited.get(start).as_deref() == Some(&true) {
            continue;
        }
        visited.set(start, true);
        let mut voxels = vec![start];
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for neighbor in connectivity.neighbors(grid, current) {
                let candidate = is_candidate.get(neighbor).as_deref() == Some(&true);
                let seen = visited.get(neighbor).as_deref() == Some(&true);
                if candidate && !seen {
                    visited.set(neighbor, true);
                    voxels.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }

        voxels.sort_unstable();
        let height = voxels
            .iter()
            .map(|&v| values.get(v).copied().unwrap_or(0.0))
            .fold(f64::NEG_INFINITY, f64::max);
        plateaus.push(Plateau { voxels, height });
    }

    plateaus
}

/// Dilation test deciding whether a plateau is a true peak
///
/// The plateau is grown by one layer of `dilation` per iteration, restricted
/// to foreground voxels. After each step the voxels of the grown region that
/// sit at its maximum are compared with the plateau: identical means a true
/// peak, disjoint means a saddle.
pub fn classify_plateau(
    plateau: &Plateau,
    values: &[f64],
    mask: &[bool],
    grid: &Grid,
    dilation: &Neighborhood,
    max_iterations: usize,
    tolerance: f64,
) -> PeakVerdict {
    let region: HashSet<usize> = plateau.voxels.iter().copied().collect();
    let mut dilated = region.clone();
    let mut frontier = plateau.voxels.clone();
    let value_at = |index: usize| values.get(index).copied().unwrap_or(0.0);

    for _ in 0..max_iterations {
        let mut next = Vec::new();
        for &voxel in &frontier {
            for neighbor in dilation.neighbors(grid, voxel) {
                if mask.get(neighbor).copied().unwrap_or(false) && dilated.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }
        frontier = next;

        let peak = dilated
            .iter()
            .map(|&index| value_at(index))
            .fold(f64::NEG_INFINITY, f64::max);
        let summit: HashSet<usize> = dilated
            .iter()
            .copied()
            .filter(|&index| value_at(index) >= peak - tolerance)
            .collect();

        if summit == region {
            return PeakVerdict::TruePeak;
        }
        if summit.is_disjoint(&region) {
            return PeakVerdict::Saddle;
        }
        if frontier.is_empty() {
            break;
        }
    }

    PeakVerdict::Undecided
}

/// Classify every plateau in parallel, preserving input order
pub fn classify_plateaus(
    plateaus: &[Plateau],
    values: &[f64],
    mask: &[bool],
    grid: &Grid,
    max_iterations: usize,
    tolerance: f64,
) -> Vec<PeakVerdict> {
    let dilation = Neighborhood::cube(grid.ndim(), 1);
    plateaus
        .par_iter()
        .map(|plateau| {
            classify_plateau(plateau, values, mask, grid, &dilation, max_iterations, tolerance)
        })
        .collect()
}

/// Plateau voxel closest to the plateau centroid, ties to the lowest index
pub fn representative(plateau: &Plateau, grid: &Grid) -> Option<usize> {
    let count = plateau.voxels.len() as f64;
    let centroid: Vec<f64> = (0..grid.ndim())
        .map(|axis| {
            plateau
                .voxels
                .iter()
                .map(|&v| grid.axis_position(v, axis) as f64)
                .sum::<f64>()
                / count
        })
        .collect();

    plateau.voxels.iter().copied().min_by(|&a, &b| {
        squared_offset(grid, a, &centroid)
            .total_cmp(&squared_offset(grid, b, &centroid))
            .then(a.cmp(&b))
    })
}

fn squared_offset(grid: &Grid, index: usize, point: &[f64]) -> f64 {
    point
        .iter()
        .enumerate()
        .map(|(axis, &p)| {
            let delta = grid.axis_position(index, axis) as f64 - p;
            delta * delta
        })
        .sum()
}
