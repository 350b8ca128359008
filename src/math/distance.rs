//! Exact Euclidean distance transform
//!
//! Squared distances are computed one axis at a time as the lower envelope of
//! parabolas rooted at every finite sample (Felzenszwalb & Huttenlocher), which
//! is exact and linear in the number of voxels for any dimensionality. Lanes
//! along an axis are independent and are processed in parallel.

use crate::spatial::extension::{crop_array, pad_default};
use crate::spatial::field::VoxelField;
use crate::spatial::grid::{Grid, flat};
use ndarray::{ArrayD, Axis, Zip};
use serde::{Deserialize, Serialize};

/// How the outside of the domain is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainBoundary {
    /// Outside the domain is background: border voxels are at most one voxel from solid
    #[default]
    Solid,
    /// The domain edge is ignored: only real background voxels count
    Open,
}

/// Distance from every voxel to the nearest background voxel, in voxel units
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMap {
    values: ArrayD<f64>,
    grid: Grid,
}

impl DistanceMap {
    /// Wrap precomputed distances
    pub fn from_array(values: ArrayD<f64>) -> Self {
        let values = values.as_standard_layout().into_owned();
        let grid = Grid::new(values.shape());
        Self { values, grid }
    }

    /// Distance array
    pub const fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// Distances in row-major order
    pub fn as_slice(&self) -> &[f64] {
        flat(&self.values)
    }

    /// Index arithmetic for this map's shape
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Distance at a linear index (0 when out of range)
    pub fn at(&self, index: usize) -> f64 {
        self.as_slice().get(index).copied().unwrap_or(0.0)
    }

    /// Largest distance in the map
    pub fn max(&self) -> f64 {
        self.as_slice().iter().copied().fold(0.0, f64::max)
    }
}

/// Compute the Euclidean distance transform of a field
///
/// Background voxels are 0. With [`DomainBoundary::Open`] a field without any
/// background has no finite distances; those are capped at the length of the
/// domain diagonal.
pub fn euclidean_distance_transform(field: &VoxelField, boundary: DomainBoundary) -> DistanceMap {
    let occupancy = match boundary {
        DomainBoundary::Solid => pad_default(field.occupancy(), 1),
        DomainBoundary::Open => field.occupancy().clone(),
    };

    let mut squared = occupancy.mapv(|foreground| if foreground { f64::INFINITY } else { 0.0 });
    for axis in 0..squared.ndim() {
        squared_distance_along(&mut squared, Axis(axis));
    }

    let squared = match boundary {
        DomainBoundary::Solid => crop_array(&squared, 1),
        DomainBoundary::Open => squared,
    };

    let cap = diagonal_length(field.shape());
    DistanceMap::from_array(squared.mapv(|d| if d.is_finite() { d.sqrt() } else { cap }))
}

/// Length of the diagonal of a box with the given extents
pub fn diagonal_length(shape: &[usize]) -> f64 {
    shape
        .iter()
        .map(|&n| (n as f64) * (n as f64))
        .sum::<f64>()
        .sqrt()
}

/// Replace every lane along `axis` with its 1D squared distance transform
fn squared_distance_along(values: &mut ArrayD<f64>, axis: Axis) {
    Zip::from(values.lanes_mut(axis)).par_for_each(|mut lane| {
        let input: Vec<f64> = lane.iter().copied().collect();
        let mut output = vec![0.0; input.len()];
        lower_envelope(&input, &mut output);
        lane.iter_mut()
            .zip(output)
            .for_each(|(slot, value)| *slot = value);
    });
}

/// 1D squared distance transform of a sampled function
///
/// `f[q]` is the squared distance already known at `q` (infinite where no
/// site has been seen). The result is `min_p (q - p)^2 + f[p]`.
pub fn lower_envelope(f: &[f64], out: &mut [f64]) {
    let mut sites: Vec<usize> = Vec::new();
    let mut starts: Vec<f64> = Vec::new();

    for (q, &fq) in f.iter().enumerate() {
        if !fq.is_finite() {
            continue;
        }
        let qf = q as f64;
        loop {
            let Some(&p) = sites.last() else {
                sites.push(q);
                starts.push(f64::NEG_INFINITY);
                break;
            };
            let pf = p as f64;
            let fp = f.get(p).copied().unwrap_or(f64::INFINITY);
            let intersection = ((fq + qf * qf) - (fp + pf * pf)) / (2.0 * (qf - pf));
            let start = starts.last().copied().unwrap_or(f64::NEG_INFINITY);
            if intersection <= start {
                sites.pop();
                starts.pop();
            } else {
                sites.push(q);
                starts.push(intersection);
                break;
            }
        }
    }

    if sites.is_empty() {
        out.iter_mut().for_each(|slot| *slot = f64::INFINITY);
        return;
    }

    let mut k = 0;
    for (q, slot) in out.iter_mut().enumerate() {
        let qf = q as f64;
        while starts.get(k + 1).is_some_and(|&s| s < qf) {
            k += 1;
        }
        let p = sites.get(k).copied().unwrap_or(0);
        let delta = qf - p as f64;
        *slot = delta.mul_add(delta, f.get(p).copied().unwrap_or(f64::INFINITY));
    }
}
