//! Marker-seeded watershed on the negated smoothed distance map
//!
//! Flooding proceeds from every marker at once through a priority queue keyed
//! by `(elevation, label, index)`, so basins grow from their deepest point
//! and ties always resolve the same way. A voxel takes its label the moment
//! it is pushed and is never pushed twice.

use crate::algorithm::markers::MarkerSet;
use crate::math::distance::DistanceMap;
use crate::spatial::grid::{Grid, flat};
use crate::spatial::neighborhood::{Connectivity, Neighborhood};
use bitvec::prelude::*;
use ndarray::{ArrayD, IxDyn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};
use tracing::debug;

/// Label of background voxels
pub const BACKGROUND: u32 = 0;

/// Transient label of foreground voxels not yet reached by any flood
pub const UNASSIGNED: u32 = u32::MAX;

/// Integer region labels over the field's grid
///
/// Background voxels are [`BACKGROUND`]; after segmentation every foreground
/// voxel carries a positive label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelImage {
    labels: ArrayD<u32>,
    grid: Grid,
}

impl LabelImage {
    /// Wrap a label array
    pub fn from_array(labels: ArrayD<u32>) -> Self {
        let labels = labels.as_standard_layout().into_owned();
        let grid = Grid::new(labels.shape());
        Self { labels, grid }
    }

    /// Label array
    pub const fn labels(&self) -> &ArrayD<u32> {
        &self.labels
    }

    /// Labels in row-major order
    pub fn as_slice(&self) -> &[u32] {
        flat(&self.labels)
    }

    /// Index arithmetic for this image's shape
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Label at a linear index ([`BACKGROUND`] when out of range)
    pub fn at(&self, index: usize) -> u32 {
        self.as_slice().get(index).copied().unwrap_or(BACKGROUND)
    }

    /// Largest region label present
    pub fn max_label(&self) -> u32 {
        self.as_slice()
            .iter()
            .copied()
            .filter(|&l| l != UNASSIGNED)
            .max()
            .unwrap_or(BACKGROUND)
    }

    /// Voxel count of every region label present
    pub fn region_sizes(&self) -> BTreeMap<u32, usize> {
        let mut sizes = BTreeMap::new();
        for &label in self.as_slice() {
            if label != BACKGROUND && label != UNASSIGNED {
                *sizes.entry(label).or_insert(0) += 1;
            }
        }
        sizes
    }

    /// Number of foreground voxels still unassigned
    pub fn unassigned_count(&self) -> usize {
        self.as_slice().iter().filter(|&&l| l == UNASSIGNED).count()
    }
}

/// Foreground component that no marker reached and was seeded afresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescuedRegion {
    /// Label given to the new marker
    pub label: u32,
    /// Voxels in the component
    pub voxels: usize,
}

/// Outcome of the watershed flood
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Labeled regions
    pub labels: LabelImage,
    /// Labels whose flood never left the seed voxel
    pub isolated: Vec<u32>,
    /// Components seeded after the main flood
    pub rescued: Vec<RescuedRegion>,
}

/// Heap entry; ordered so that [`BinaryHeap`] pops the lowest key first
#[derive(Debug, Clone, Copy)]
struct FloodFront {
    elevation: f64,
    label: u32,
    index: usize,
}

impl Ord for FloodFront {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.label.cmp(&self.label))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for FloodFront {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FloodFront {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodFront {}

/// Priority-flood segmenter
#[derive(Debug, Clone)]
pub struct WatershedSegmenter {
    neighborhood: Neighborhood,
}

impl WatershedSegmenter {
    /// Segmenter flooding across the given adjacency
    pub fn new(ndim: usize, connectivity: Connectivity) -> Self {
        Self {
            neighborhood: Neighborhood::new(ndim, connectivity),
        }
    }

    /// Flood the foreground from the markers
    ///
    /// Elevation is the negated smoothed distance. Foreground components
    /// containing no marker receive a new marker at their highest smoothed
    /// voxel (ties to the lowest index), appended to `markers`, so that every
    /// foreground voxel ends up labeled.
    pub fn segment(
        &self,
        smoothed: &ArrayD<f64>,
        mask: &[bool],
        markers: &mut MarkerSet,
        distance: &DistanceMap,
    ) -> Segmentation {
        let grid = Grid::new(smoothed.shape());
        let values = flat(smoothed);
        let mut labels: Vec<u32> = mask
            .iter()
            .map(|&foreground| if foreground { UNASSIGNED } else { BACKGROUND })
            .collect();
        let mut heap = BinaryHeap::new();

        for marker in markers.iter() {
            if let Some(slot) = labels.get_mut(marker.index) {
                *slot = marker.label;
                heap.push(self.front(values, marker.label, marker.index));
            }
        }
        self.flood(&mut heap, &mut labels, &grid, values);

        let mut rescued = Vec::new();
        let mut visited = bitvec![0; labels.len()];
        let mut cursor = 0;
        while let Some(start) = (cursor..labels.len()).find(|&i| labels.get(i) == Some(&UNASSIGNED)) {
            cursor = start;
            let component = self.unassigned_component(&labels, &grid, start, &mut visited);
            let seed = component
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    let va = values.get(a).copied().unwrap_or(0.0);
                    let vb = values.get(b).copied().unwrap_or(0.0);
                    va.total_cmp(&vb).then(b.cmp(&a))
                })
                .unwrap_or(start);

            let label = markers.push(seed, &grid, values, distance);
            if let Some(slot) = labels.get_mut(seed) {
                *slot = label;
            }
            heap.push(self.front(values, label, seed));
            self.flood(&mut heap, &mut labels, &grid, values);
            rescued.push(RescuedRegion {
                label,
                voxels: component.len(),
            });
        }

        // The label buffer was built from `mask`, which has the grid's length
        let labels = LabelImage::from_array(
            ArrayD::from_shape_vec(IxDyn(grid.shape()), labels)
                .unwrap_or_else(|_| ArrayD::zeros(IxDyn(grid.shape()))),
        );
        let sizes = labels.region_sizes();
        let isolated: Vec<u32> = markers
            .iter()
            .map(|m| m.label)
            .filter(|label| sizes.get(label).copied().unwrap_or(0) <= 1)
            .collect();
        debug!(
            regions = sizes.len(),
            isolated = isolated.len(),
            rescued = rescued.len(),
            "watershed complete"
        );

        Segmentation {
            labels,
            isolated,
            rescued,
        }
    }

    fn front(&self, values: &[f64], label: u32, index: usize) -> FloodFront {
        FloodFront {
            elevation: -values.get(index).copied().unwrap_or(0.0),
            label,
            index,
        }
    }

    fn flood(&self, heap: &mut BinaryHeap<FloodFront>, labels: &mut [u32], grid: &Grid, values: &[f64]) {
        while let Some(current) = heap.pop() {
            for neighbor in self.neighborhood.neighbors(grid, current.index) {
                if let Some(slot) = labels.get_mut(neighbor)
                    && *slot == UNASSIGNED
                {
                    *slot = current.label;
                    heap.push(self.front(values, current.label, neighbor));
                }
            }
        }
    }

    /// Unassigned voxels connected to `start`
    ///
    /// `visited` is shared across calls; components are disjoint, so bits
    /// left by earlier components never block a later one.
    fn unassigned_component(
        &self,
        labels: &[u32],
        grid: &Grid,
        start: usize,
        visited: &mut BitVec,
    ) -> Vec<usize> {
        visited.set(start, true);
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighborhood.neighbors(grid, current) {
                let open = labels.get(neighbor) == Some(&UNASSIGNED);
                if open && visited.get(neighbor).as_deref() == Some(&false) {
                    visited.set(neighbor, true);
                    component.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        component
    }
}
