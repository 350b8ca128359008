//! Region measurement and pore network assembly

/// Network assembly from a label image
pub mod builder;
/// Pore network graph and table types
pub mod graph;
/// Per-region voxel statistics
pub mod regions;
/// Interfaces between touching regions
pub mod throats;
