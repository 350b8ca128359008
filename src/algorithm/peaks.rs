//! Local maxima detection on the smoothed distance map

use crate::spatial::grid::Grid;
use crate::spatial::neighborhood::Neighborhood;
use rayon::prelude::*;

/// Linear indices of all local maxima, ascending
///
/// A voxel is a candidate when it is foreground, has a positive value and is
/// not exceeded by more than `tolerance` by any in-grid voxel of the
/// footprint. Plateaus therefore yield one candidate per voxel; they are
/// collapsed later by plateau trimming.
pub fn find_peaks(
    values: &[f64],
    mask: &[bool],
    grid: &Grid,
    footprint: &Neighborhood,
    tolerance: f64,
) -> Vec<usize> {
    (0..grid.len())
        .into_par_iter()
        .filter(|&index| is_peak(values, mask, grid, footprint, tolerance, index))
        .collect()
}

/// Check a single voxel against its footprint
pub fn is_peak(
    values: &[f64],
    mask: &[bool],
    grid: &Grid,
    footprint: &Neighborhood,
    tolerance: f64,
    index: usize,
) -> bool {
    if !mask.get(index).copied().unwrap_or(false) {
        return false;
    }
    let value = values.get(index).copied().unwrap_or(0.0);
    if value <= 0.0 {
        return false;
    }
    footprint
        .neighbors(grid, index)
        .all(|neighbor| values.get(neighbor).copied().unwrap_or(0.0) <= value + tolerance)
}
