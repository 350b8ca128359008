//! Error types for pipeline validation and file operations
//!
//! Recoverable conditions met while processing a field (degenerate input,
//! isolated markers) are not errors; they are reported as
//! [`Anomaly`](crate::algorithm::pipeline::Anomaly) values in the run
//! diagnostics.

use crate::algorithm::pipeline::Stage;
use std::path::PathBuf;

/// Main error type for all extraction operations
#[derive(Debug, thiserror::Error)]
pub enum SnowError {
    /// Input field rejected before processing began
    #[error("Invalid input at {stage}: {reason}")]
    InvalidInput {
        /// Stage that rejected the input
        stage: Stage,
        /// Description of the violated constraint
        reason: String,
    },

    /// Configuration parameter failed validation
    #[error("Invalid configuration '{parameter}' = '{value}': {reason}")]
    Configuration {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to load an input image from the filesystem
    #[error("Failed to load image '{}': {source}", path.display())]
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        #[source]
        source: image::ImageError,
    },

    /// Failed to save a diagnostic image to disk
    #[error("Failed to export image to '{}': {source}", path.display())]
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        #[source]
        source: image::ImageError,
    },

    /// General file system operation failure
    #[error("File system error during {operation} on '{}': {source}", path.display())]
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Network tables could not be serialized or parsed
    #[error("Serialization error for '{}': {source}", path.display())]
    Serialization {
        /// File being written or read
        path: PathBuf,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Dedicated worker pool could not be created
    #[error("Failed to build worker pool with {threads} threads: {source}")]
    ThreadPool {
        /// Requested thread count
        threads: usize,
        /// Underlying rayon error
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Convenience type alias for extraction results
pub type Result<T> = std::result::Result<T, SnowError>;

impl From<std::io::Error> for SnowError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid input error for the given stage
pub fn invalid_input(stage: Stage, reason: &impl ToString) -> SnowError {
    SnowError::InvalidInput {
        stage,
        reason: reason.to_string(),
    }
}

/// Create a configuration error
pub fn configuration_error(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> SnowError {
    SnowError::Configuration {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl SnowError {
    /// Whether the error was raised by configuration validation
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Stage that rejected the input, if this is an input error
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidInput { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
