//! Pore network extraction from 2D and 3D voxel images
//!
//! The SNOW approach computes a distance transform of the pore space, picks
//! one marker per pore from the smoothed distance peaks, floods the pore space
//! from those markers and measures the resulting regions and their interfaces
//! as a graph of pores and throats.

#![forbid(unsafe_code)]

/// Marker extraction, watershed segmentation and pipeline orchestration
pub mod algorithm;
/// Region measurement and pore network assembly
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Distance transform and Gaussian smoothing
pub mod math;
/// Voxel fields, grids, neighborhoods and domain faces
pub mod spatial;

pub use algorithm::pipeline::{
    Anomaly, Diagnostics, PipelineObserver, SnowOutput, SnowPipeline, Stage, extract_network,
};
pub use analysis::graph::{NetworkTables, PoreNetworkGraph, PoreNode, ThroatEdge};
pub use io::configuration::SnowConfig;
pub use io::error::{Result, SnowError};
pub use spatial::field::VoxelField;
