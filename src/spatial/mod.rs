//! Spatial data structures for voxel images
//!
//! This module contains spatial-related functionality including:
//! - Occupancy fields and their validation
//! - Row-major index arithmetic and bounding boxes
//! - Neighbor schemes and structuring elements
//! - Domain faces, perimeter masks and array padding

/// Domain faces and perimeter masks
pub mod border;
/// Constant padding and cropping of arrays
pub mod extension;
/// Validated occupancy images
pub mod field;
/// Index arithmetic and bounding boxes
pub mod grid;
/// Connectivity and structuring elements
pub mod neighborhood;

pub use border::Face;
pub use field::{FieldKind, VoxelField};
pub use grid::{BoundingBox, Coord, Grid, Point};
pub use neighborhood::{Connectivity, Neighborhood};
