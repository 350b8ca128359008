//! Row-major index arithmetic and axis-aligned bounding boxes
//!
//! Every array in the pipeline is stored in standard layout, so a voxel can be
//! addressed either by its coordinate tuple or by its linear index. [`Grid`]
//! converts between the two and performs bounds-checked neighbor offsets.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Integer voxel coordinate (one entry per axis)
pub type Coord = SmallVec<[usize; 3]>;

/// Signed coordinate offset (one entry per axis)
pub type Offset = SmallVec<[isize; 3]>;

/// Physical or fractional position (one entry per axis)
pub type Point = SmallVec<[f64; 3]>;

/// Shape and row-major strides of an N-dimensional array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl Grid {
    /// Create a grid for the given shape
    pub fn new(shape: &[usize]) -> Self {
        let mut strides = vec![1; shape.len()];
        let mut stride = 1;
        for (axis, &extent) in shape.iter().enumerate().rev() {
            if let Some(slot) = strides.get_mut(axis) {
                *slot = stride;
            }
            stride *= extent;
        }

        Self {
            shape: shape.to_vec(),
            strides,
        }
    }

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent along each axis
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major stride of each axis
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the grid holds no voxels
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate tuple of a linear index
    pub fn coords(&self, index: usize) -> Coord {
        self.shape
            .iter()
            .zip(&self.strides)
            .map(|(&extent, &stride)| (index / stride) % extent.max(1))
            .collect()
    }

    /// Linear index of a coordinate tuple, `None` when out of range
    pub fn index(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.ndim() {
            return None;
        }
        let mut index = 0;
        for ((&c, &extent), &stride) in coords.iter().zip(&self.shape).zip(&self.strides) {
            if c >= extent {
                return None;
            }
            index += c * stride;
        }
        Some(index)
    }

    /// Linear index of `index + offset`, `None` when the result leaves the grid
    pub fn offset(&self, index: usize, offset: &[isize]) -> Option<usize> {
        let mut target = index;
        for (axis, &delta) in offset.iter().enumerate() {
            if delta == 0 {
                continue;
            }
            let stride = *self.strides.get(axis)?;
            let extent = *self.shape.get(axis)?;
            if extent == 0 {
                return None;
            }
            let position = (index / stride) % extent;
            let moved = position.checked_add_signed(delta)?;
            if moved >= extent {
                return None;
            }
            target = if moved > position {
                target + (moved - position) * stride
            } else {
                target - (position - moved) * stride
            };
        }
        Some(target)
    }

    /// Position of `index` along a single axis
    pub fn axis_position(&self, index: usize, axis: usize) -> usize {
        match (self.strides.get(axis), self.shape.get(axis)) {
            (Some(&stride), Some(&extent)) if extent > 0 => (index / stride) % extent,
            _ => 0,
        }
    }

    /// Euclidean distance between two voxels in voxel units
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        (0..self.ndim())
            .map(|axis| {
                let delta = self.axis_position(a, axis) as f64 - self.axis_position(b, axis) as f64;
                delta * delta
            })
            .sum::<f64>()
            .sqrt()
    }
}

/// Flat view of a standard-layout array
///
/// Arrays produced inside the crate are always standard layout; a
/// non-contiguous array yields an empty slice.
pub fn flat<T>(array: &ArrayD<T>) -> &[T] {
    array.as_slice().unwrap_or(&[])
}

/// Axis-aligned bounding box with inclusive corners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum coordinates (inclusive)
    pub min: Coord,
    /// Maximum coordinates (inclusive)
    pub max: Coord,
}

impl BoundingBox {
    /// Box containing a single voxel
    pub fn from_point(coords: &[usize]) -> Self {
        Self {
            min: coords.iter().copied().collect(),
            max: coords.iter().copied().collect(),
        }
    }

    /// Grow the box to include a voxel
    pub fn include(&mut self, coords: &[usize]) {
        for ((lo, hi), &c) in self.min.iter_mut().zip(self.max.iter_mut()).zip(coords) {
            *lo = (*lo).min(c);
            *hi = (*hi).max(c);
        }
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.include(&other.min);
        merged.include(&other.max);
        merged
    }

    /// Check if a voxel is within the bounds
    pub fn contains(&self, coords: &[usize]) -> bool {
        coords.len() == self.min.len()
            && coords
                .iter()
                .zip(self.min.iter().zip(&self.max))
                .all(|(&c, (&lo, &hi))| c >= lo && c <= hi)
    }

    /// Extent of the box along each axis
    pub fn extent(&self) -> Coord {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(&lo, &hi)| hi - lo + 1)
            .collect()
    }

    /// Number of voxels covered by the box
    pub fn volume(&self) -> usize {
        self.extent().iter().product()
    }
}
