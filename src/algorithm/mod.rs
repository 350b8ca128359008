/// Boundary-face tagging and virtual boundary pores
pub mod boundary;
/// Marker extraction and labeling
pub mod markers;
/// Local maxima detection
pub mod peaks;
/// Stage orchestration, diagnostics and observers
pub mod pipeline;
/// Proximity trimming of markers
pub mod proximity;
/// Plateau grouping and saddle trimming
pub mod saddle;
/// Marker-seeded watershed segmentation
pub mod watershed;
