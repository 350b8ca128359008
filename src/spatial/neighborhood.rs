//! Neighbor schemes and structuring elements for N-dimensional grids

use crate::io::error::{Result, configuration_error};
use crate::spatial::grid::{Grid, Offset};
use serde::{Deserialize, Serialize};

/// Which neighbors of a voxel count as adjacent
///
/// Expressed independently of dimensionality: `Faces` is 4-connected in 2D
/// and 6-connected in 3D, `Edges` is 8/18, `Full` is 8/26. In 2D `Edges`
/// and `Full` coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Neighbors sharing a face
    Faces,
    /// Neighbors sharing a face or an edge
    Edges,
    /// Neighbors sharing a face, edge or corner
    #[default]
    Full,
}

impl Connectivity {
    /// Resolve a conventional neighbor count (4, 8, 6, 18, 26) for a dimensionality
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the count is not supported for `ndim`
    pub fn from_neighbor_count(ndim: usize, count: usize) -> Result<Self> {
        match (ndim, count) {
            (2, 4) | (3, 6) => Ok(Self::Faces),
            (2, 8) => Ok(Self::Full),
            (3, 18) => Ok(Self::Edges),
            (3, 26) => Ok(Self::Full),
            _ => Err(configuration_error(
                "connectivity",
                &count,
                &format!("unsupported neighbor count for a {ndim}D field (use 4/8 in 2D, 6/18/26 in 3D)"),
            )),
        }
    }

    /// Maximum number of nonzero offset components allowed
    const fn max_nonzero(self) -> usize {
        match self {
            Self::Faces => 1,
            Self::Edges => 2,
            Self::Full => usize::MAX,
        }
    }

    /// Number of neighbors of an interior voxel
    pub fn neighbor_count(self, ndim: usize) -> usize {
        Neighborhood::new(ndim, self).len()
    }
}

/// Set of coordinate offsets defining the neighbors of a voxel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhood {
    offsets: Vec<Offset>,
}

impl Neighborhood {
    /// Neighbors at Chebyshev distance one filtered by connectivity
    pub fn new(ndim: usize, connectivity: Connectivity) -> Self {
        let offsets = cube_offsets(ndim, 1)
            .into_iter()
            .filter(|offset| {
                let nonzero = offset.iter().filter(|&&d| d != 0).count();
                nonzero > 0 && nonzero <= connectivity.max_nonzero()
            })
            .collect();
        Self { offsets }
    }

    /// All offsets within a cube of the given half width, center excluded
    pub fn cube(ndim: usize, half_width: usize) -> Self {
        let offsets = cube_offsets(ndim, half_width)
            .into_iter()
            .filter(|offset| offset.iter().any(|&d| d != 0))
            .collect();
        Self { offsets }
    }

    /// Disk (2D) or ball (3D) structuring element, center excluded
    ///
    /// Offsets whose Euclidean length is strictly below `radius` are kept,
    /// matching a distance-transform-thresholded ball.
    pub fn ball(ndim: usize, radius: f64) -> Self {
        let half_width = radius.max(0.0).ceil() as usize;
        let offsets = cube_offsets(ndim, half_width)
            .into_iter()
            .filter(|offset| {
                let squared: isize = offset.iter().map(|&d| d * d).sum();
                squared > 0 && (squared as f64).sqrt() < radius
            })
            .collect();
        Self { offsets }
    }

    /// The offsets of this neighborhood
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Number of offsets
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the neighborhood has no offsets
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// In-grid neighbor indices of a voxel
    pub fn neighbors<'a>(&'a self, grid: &'a Grid, index: usize) -> impl Iterator<Item = usize> + 'a {
        self.offsets
            .iter()
            .filter_map(move |offset| grid.offset(index, offset))
    }
}

/// Every offset in `[-half_width, half_width]^ndim`, in lexicographic order
fn cube_offsets(ndim: usize, half_width: usize) -> Vec<Offset> {
    let span = half_width as isize;
    let mut offsets: Vec<Offset> = vec![Offset::new()];
    for _ in 0..ndim {
        offsets = offsets
            .into_iter()
            .flat_map(|prefix| {
                (-span..=span).map(move |d| {
                    let mut next = prefix.clone();
                    next.push(d);
                    next
                })
            })
            .collect();
    }
    offsets
}
