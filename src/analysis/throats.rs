//! Interfaces between face-adjacent regions

use crate::algorithm::watershed::LabelImage;
use crate::analysis::regions::is_region;
use crate::math::distance::DistanceMap;
use crate::spatial::grid::Point;
use hashbrown::HashMap;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;

const CHUNK_SIZE: usize = 1 << 14;

/// Accumulated statistics of the interface between two regions
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceStats {
    /// Number of shared voxel faces
    pub face_count: u64,
    /// Sum over faces of `coords(a) + coords(b)`, i.e. midpoints in half-voxel units
    pub midpoint_sum: SmallVec<[u64; 3]>,
    /// Smallest raw distance among voxels on either side of the interface
    pub min_distance: f64,
}

impl InterfaceStats {
    fn merge(&mut self, other: &Self) {
        self.face_count += other.face_count;
        for (sum, &s) in self.midpoint_sum.iter_mut().zip(&other.midpoint_sum) {
            *sum += s;
        }
        self.min_distance = self.min_distance.min(other.min_distance);
    }

    /// Mean face midpoint, in voxel units
    pub fn centroid(&self) -> Point {
        let count = 2.0 * self.face_count.max(1) as f64;
        self.midpoint_sum
            .iter()
            .map(|&sum| sum as f64 / count)
            .collect()
    }
}

/// Collect every pair of distinct regions sharing at least one voxel face
///
/// Keys are ordered `(a, b)` with `a < b`.
pub fn accumulate_interfaces(
    labels: &LabelImage,
    distance: &DistanceMap,
) -> BTreeMap<(u32, u32), InterfaceStats> {
    let grid = labels.grid();
    let values = labels.as_slice();
    let ndim = grid.ndim();

    let merged = values
        .par_chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(chunk, slice)| {
            let mut local: HashMap<(u32, u32), InterfaceStats> = HashMap::new();
            for (offset, &label) in slice.iter().enumerate() {
                if !is_region(label) {
                    continue;
                }
                let index = chunk * CHUNK_SIZE + offset;
                for axis in 0..ndim {
                    let mut step: SmallVec<[isize; 3]> = SmallVec::from_elem(0, ndim);
                    if let Some(slot) = step.get_mut(axis) {
                        *slot = 1;
                    }
                    let Some(neighbor) = grid.offset(index, &step) else {
                        continue;
                    };
                    let other = values.get(neighbor).copied().unwrap_or(label);
                    if other == label || !is_region(other) {
                        continue;
                    }

                    let key = (label.min(other), label.max(other));
                    let here = grid.coords(index);
                    let there = grid.coords(neighbor);
                    let nearest = distance.at(index).min(distance.at(neighbor));
                    let entry = local.entry(key).or_insert_with(|| InterfaceStats {
                        face_count: 0,
                        midpoint_sum: SmallVec::from_elem(0, ndim),
                        min_distance: f64::INFINITY,
                    });
                    entry.face_count += 1;
                    for ((sum, &a), &b) in entry.midpoint_sum.iter_mut().zip(&here).zip(&there) {
                        *sum += (a + b) as u64;
                    }
                    entry.min_distance = entry.min_distance.min(nearest);
                }
            }
            local
        })
        .reduce(HashMap::new, |mut left, right| {
            for (key, stats) in right {
                left.entry(key)
                    .and_modify(|existing| existing.merge(&stats))
                    .or_insert(stats);
            }
            left
        });

    merged.into_iter().collect()
}
