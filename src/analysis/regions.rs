//! Per-label voxel statistics gathered in one parallel pass
//!
//! Every quantity is an integer count, an integer sum or a min/max, so the
//! merge order chosen by rayon cannot change the result.

use crate::algorithm::watershed::{BACKGROUND, LabelImage, UNASSIGNED};
use crate::spatial::grid::{BoundingBox, Grid, Point};
use hashbrown::HashMap;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Voxels per parallel work unit
const CHUNK_SIZE: usize = 1 << 14;

/// Accumulated statistics of one labeled region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionStats {
    /// Number of voxels
    pub voxel_count: u64,
    /// Sum of voxel coordinates per axis
    pub coordinate_sum: SmallVec<[u64; 3]>,
    /// Tight box around the region
    pub bounding_box: BoundingBox,
    /// Voxel faces shared with a different label or with background, not
    /// counting faces on the domain edge
    pub surface_faces: u64,
}

impl RegionStats {
    fn new(coords: &[usize], surface_faces: u64) -> Self {
        Self {
            voxel_count: 1,
            coordinate_sum: coords.iter().map(|&c| c as u64).collect(),
            bounding_box: BoundingBox::from_point(coords),
            surface_faces,
        }
    }

    fn add(&mut self, coords: &[usize], surface_faces: u64) {
        self.voxel_count += 1;
        for (sum, &c) in self.coordinate_sum.iter_mut().zip(coords) {
            *sum += c as u64;
        }
        self.bounding_box.include(coords);
        self.surface_faces += surface_faces;
    }

    fn merge(&mut self, other: &Self) {
        self.voxel_count += other.voxel_count;
        for (sum, &s) in self.coordinate_sum.iter_mut().zip(&other.coordinate_sum) {
            *sum += s;
        }
        self.bounding_box = self.bounding_box.union(&other.bounding_box);
        self.surface_faces += other.surface_faces;
    }

    /// Mean voxel coordinate, in voxel units
    pub fn centroid(&self) -> Point {
        let count = self.voxel_count.max(1) as f64;
        self.coordinate_sum
            .iter()
            .map(|&sum| sum as f64 / count)
            .collect()
    }
}

/// Whether a label denotes a published region
pub const fn is_region(label: u32) -> bool {
    label != BACKGROUND && label != UNASSIGNED
}

/// Gather statistics for every region of a label image
pub fn accumulate_regions(labels: &LabelImage) -> BTreeMap<u32, RegionStats> {
    let grid = labels.grid();
    let values = labels.as_slice();

    let merged = values
        .par_chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(chunk, slice)| {
            let mut local: HashMap<u32, RegionStats> = HashMap::new();
            for (offset, &label) in slice.iter().enumerate() {
                if !is_region(label) {
                    continue;
                }
                let index = chunk * CHUNK_SIZE + offset;
                let coords = grid.coords(index);
                let faces = surface_faces(values, grid, index, label);
                local
                    .entry(label)
                    .and_modify(|stats| stats.add(&coords, faces))
                    .or_insert_with(|| RegionStats::new(&coords, faces));
            }
            local
        })
        .reduce(HashMap::new, |mut left, right| {
            for (label, stats) in right {
                left.entry(label)
                    .and_modify(|existing| existing.merge(&stats))
                    .or_insert(stats);
            }
            left
        });

    merged.into_iter().collect()
}

/// Faces of a voxel adjoining a different label inside the grid
///
/// Faces on the domain edge are not counted.
fn surface_faces(values: &[u32], grid: &Grid, index: usize, label: u32) -> u64 {
    let mut step: SmallVec<[isize; 3]> = SmallVec::from_elem(0, grid.ndim());
    let mut count = 0;
    for axis in 0..grid.ndim() {
        for delta in [-1, 1] {
            if let Some(slot) = step.get_mut(axis) {
                *slot = delta;
            }
            if let Some(neighbor) = grid.offset(index, &step)
                && values.get(neighbor).copied() != Some(label)
            {
                count += 1;
            }
        }
        if let Some(slot) = step.get_mut(axis) {
            *slot = 0;
        }
    }
    count
}
