//! Validated occupancy images with physical voxel size

use crate::algorithm::pipeline::Stage;
use crate::io::error::{Result, invalid_input};
use crate::spatial::grid::{Grid, flat};
use ndarray::{ArrayD, IxDyn};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Classification of a field by its foreground content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// No foreground voxels
    AllBackground,
    /// No background voxels
    AllForeground,
    /// Both phases present
    Mixed,
}

/// Binary 2D or 3D image of the pore space
///
/// `true` marks foreground (pore space). The array is stored in standard
/// layout and never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelField {
    occupancy: ArrayD<bool>,
    grid: Grid,
    voxel_size: f64,
}

impl VoxelField {
    /// Wrap a boolean occupancy array
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if:
    /// - The voxel size is not finite and positive
    /// - The array has fewer than 2 or more than 3 dimensions
    /// - The array holds no voxels
    pub fn from_occupancy(occupancy: ArrayD<bool>, voxel_size: f64) -> Result<Self> {
        validate_voxel_size(voxel_size)?;
        validate_shape(occupancy.shape())?;

        let occupancy = occupancy.as_standard_layout().into_owned();
        let grid = Grid::new(occupancy.shape());
        Ok(Self {
            occupancy,
            grid,
            voxel_size,
        })
    }

    /// Threshold a real-valued density array: voxels above `threshold` are foreground
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if:
    /// - The density contains values that are not finite numbers
    /// - The threshold is not finite
    /// - The shape or voxel size is invalid (see [`Self::from_occupancy`])
    pub fn from_density<T>(density: &ArrayD<T>, threshold: f64, voxel_size: f64) -> Result<Self>
    where
        T: ToPrimitive + Copy,
    {
        if !threshold.is_finite() {
            return Err(invalid_input(
                Stage::Validation,
                &format!("threshold {threshold} is not finite"),
            ));
        }

        let mut occupancy = Vec::with_capacity(density.len());
        for value in density.iter().map(|v| v.to_f64()) {
            match value {
                Some(v) if v.is_finite() => occupancy.push(v > threshold),
                _ => {
                    return Err(invalid_input(
                        Stage::Validation,
                        &"density contains a value that is not a finite number",
                    ));
                }
            }
        }

        let array = ArrayD::from_shape_vec(IxDyn(density.shape()), occupancy).map_err(|e| {
            invalid_input(Stage::Validation, &format!("density shape mismatch: {e}"))
        })?;
        Self::from_occupancy(array, voxel_size)
    }

    /// Build a field by evaluating a predicate at every coordinate
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if the shape or voxel size is invalid
    pub fn from_shape_fn<F>(shape: &[usize], voxel_size: f64, mut predicate: F) -> Result<Self>
    where
        F: FnMut(&[usize]) -> bool,
    {
        validate_shape(shape)?;
        let grid = Grid::new(shape);
        let values = (0..grid.len())
            .map(|index| predicate(&grid.coords(index)))
            .collect();
        let array = ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|e| {
            invalid_input(Stage::Validation, &format!("shape mismatch: {e}"))
        })?;
        Self::from_occupancy(array, voxel_size)
    }

    /// Occupancy array
    pub const fn occupancy(&self) -> &ArrayD<bool> {
        &self.occupancy
    }

    /// Occupancy in row-major order
    pub fn as_slice(&self) -> &[bool] {
        flat(&self.occupancy)
    }

    /// Index arithmetic for this field's shape
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Physical edge length of one voxel
    pub const fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Number of axes (2 or 3)
    pub fn ndim(&self) -> usize {
        self.grid.ndim()
    }

    /// Extent along each axis
    pub fn shape(&self) -> &[usize] {
        self.grid.shape()
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// Always false for a validated field
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Occupancy at a coordinate, `None` when out of range
    pub fn get(&self, coords: &[usize]) -> Option<bool> {
        self.grid
            .index(coords)
            .and_then(|index| self.as_slice().get(index).copied())
    }

    /// Number of foreground voxels
    pub fn foreground_count(&self) -> usize {
        self.as_slice().iter().filter(|&&v| v).count()
    }

    /// Physical volume of one voxel (area in 2D)
    pub fn voxel_volume(&self) -> f64 {
        self.voxel_size.powi(self.ndim() as i32)
    }

    /// Classify the field by phase content
    pub fn kind(&self) -> FieldKind {
        let foreground = self.foreground_count();
        if foreground == 0 {
            FieldKind::AllBackground
        } else if foreground == self.len() {
            FieldKind::AllForeground
        } else {
            FieldKind::Mixed
        }
    }
}

fn validate_voxel_size(voxel_size: f64) -> Result<()> {
    if voxel_size.is_finite() && voxel_size > 0.0 {
        Ok(())
    } else {
        Err(invalid_input(
            Stage::Validation,
            &format!("voxel size {voxel_size} must be finite and positive"),
        ))
    }
}

fn validate_shape(shape: &[usize]) -> Result<()> {
    if !(2..=3).contains(&shape.len()) {
        return Err(invalid_input(
            Stage::Validation,
            &format!("field has {} dimensions, expected 2 or 3", shape.len()),
        ));
    }
    if shape.iter().any(|&extent| extent == 0) {
        return Err(invalid_input(
            Stage::Validation,
            &format!("field shape {shape:?} holds no voxels"),
        ));
    }
    Ok(())
}
