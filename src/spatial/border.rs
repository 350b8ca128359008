//! Domain faces and their voxel layers

use crate::io::error::{Result, configuration_error};
use crate::spatial::grid::Grid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A face of the rectangular domain
///
/// `Left`/`Right` bound axis 0 (x), `Front`/`Back` bound axis 1 (y) and
/// `Top`/`Bottom` bound axis 2 (z, 3D only). The lower face of each pair
/// sits at coordinate 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    /// Axis 0, coordinate 0
    Left,
    /// Axis 0, last coordinate
    Right,
    /// Axis 1, coordinate 0
    Front,
    /// Axis 1, last coordinate
    Back,
    /// Axis 2, coordinate 0
    Bottom,
    /// Axis 2, last coordinate
    Top,
}

impl Face {
    /// All faces in canonical order
    pub const ALL: [Self; 6] = [
        Self::Left,
        Self::Right,
        Self::Front,
        Self::Back,
        Self::Bottom,
        Self::Top,
    ];

    /// Faces available for a dimensionality
    pub fn for_ndim(ndim: usize) -> &'static [Self] {
        let count = (2 * ndim).min(Self::ALL.len());
        Self::ALL.get(..count).unwrap_or(&[])
    }

    /// Axis the face is perpendicular to
    pub const fn axis(self) -> usize {
        match self {
            Self::Left | Self::Right => 0,
            Self::Front | Self::Back => 1,
            Self::Bottom | Self::Top => 2,
        }
    }

    /// Whether the face sits at the high end of its axis
    pub const fn is_upper(self) -> bool {
        matches!(self, Self::Right | Self::Back | Self::Top)
    }

    /// Lowercase name of the face
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Front => "front",
            Self::Back => "back",
            Self::Bottom => "bottom",
            Self::Top => "top",
        }
    }

    /// Coordinate of the face layer along its axis
    pub fn layer(self, grid: &Grid) -> usize {
        if self.is_upper() {
            grid.shape()
                .get(self.axis())
                .map_or(0, |extent| extent.saturating_sub(1))
        } else {
            0
        }
    }

    /// Whether a voxel lies on this face layer
    pub fn contains(self, grid: &Grid, index: usize) -> bool {
        self.axis() < grid.ndim() && grid.axis_position(index, self.axis()) == self.layer(grid)
    }

    /// Linear indices of every voxel on the face layer, ascending
    pub fn voxels(self, grid: &Grid) -> Vec<usize> {
        if self.axis() >= grid.ndim() {
            return Vec::new();
        }
        (0..grid.len())
            .filter(|&index| self.contains(grid, index))
            .collect()
    }

    /// Parse a face name and check it exists for `ndim`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the name is unknown or the face
    /// does not exist in a field of this dimensionality
    pub fn parse_for(name: &str, ndim: usize) -> Result<Self> {
        let face: Self = name.parse()?;
        if face.axis() >= ndim {
            return Err(configuration_error(
                "boundary_faces",
                &name,
                &format!("face does not exist in a {ndim}D field"),
            ));
        }
        Ok(face)
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Face {
    type Err = crate::io::error::SnowError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|face| face.name() == lowered)
            .ok_or_else(|| {
                configuration_error(
                    "boundary_faces",
                    &s,
                    &"expected one of left, right, front, back, bottom, top",
                )
            })
    }
}
