/// Exact Euclidean distance transform
pub mod distance;
/// Separable Gaussian smoothing
pub mod gaussian;
