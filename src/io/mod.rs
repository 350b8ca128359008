//! Input/output operations and error handling

/// Command-line interface and batch processing
pub mod cli;
/// Extraction constants and runtime configuration
pub mod configuration;
/// Error types and constructors
pub mod error;
/// JSON export of network tables
pub mod export;
/// PNG loading and label image export
pub mod image;
/// Progress bars driven by pipeline events
pub mod progress;
