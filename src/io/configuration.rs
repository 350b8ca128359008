//! Extraction constants and runtime configuration

use crate::algorithm::boundary::BoundaryOptions;
use crate::algorithm::markers::MarkerParams;
use crate::analysis::graph::ConduitLength;
use crate::io::error::{Result, SnowError, configuration_error};
use crate::math::distance::DomainBoundary;
use crate::spatial::border::Face;
use crate::spatial::neighborhood::Connectivity;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Marker extraction defaults
/// Gaussian smoothing sigma in voxels
pub const DEFAULT_SIGMA: f64 = 0.4;
/// Gaussian kernel truncation in standard deviations
pub const DEFAULT_TRUNCATE: f64 = 4.0;
/// Dilation steps allowed per plateau before it is kept undecided
pub const DEFAULT_SADDLE_MAX_ITERATIONS: usize = 10;
/// Smoothed values closer than this are treated as equal
pub const DEFAULT_PLATEAU_TOLERANCE: f64 = 1e-9;
/// Proximity suppression radius as a multiple of peak height
pub const DEFAULT_PROXIMITY_FACTOR: f64 = 1.0;
/// Absolute minimum marker separation in voxels
pub const DEFAULT_MARKER_MIN_DISTANCE: f64 = 0.0;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 50;

// Output settings
/// Suffix of the network table file
pub const NETWORK_SUFFIX: &str = "_network.json";
/// Suffix of the label image file
pub const LABELS_SUFFIX: &str = "_labels.png";
/// Fixed seed for the label colour permutation
pub const DEFAULT_COLOR_SEED: u64 = 42;

/// User-facing extraction settings
///
/// Dimension-independent checks happen in [`Self::validate`]; face names and
/// neighbor counts are checked against the field in [`Self::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    /// Gaussian sigma in voxels; 0 disables smoothing
    pub sigma: f64,
    /// Gaussian kernel truncation in standard deviations
    pub truncate: f64,
    /// Adjacency for plateaus, peak footprint and flooding
    pub connectivity: Connectivity,
    /// Conventional neighbor count (4/8 or 6/18/26) overriding `connectivity`
    pub neighbor_count: Option<usize>,
    /// Ball radius of the peak footprint, in voxels
    pub peak_footprint_radius: Option<f64>,
    /// Dilation steps allowed per plateau in the saddle test
    pub saddle_max_iterations: usize,
    /// Tolerance for treating smoothed values as equal
    pub plateau_tolerance: f64,
    /// Proximity suppression radius as a multiple of peak height
    pub proximity_factor: f64,
    /// Absolute minimum marker separation in voxels
    pub marker_min_distance: f64,
    /// Interpretation of the outside of the domain
    pub domain_boundary: DomainBoundary,
    /// Conduit length rule for throats
    pub conduit_length: ConduitLength,
    /// Names of the faces to tag
    pub boundary_faces: Vec<String>,
    /// Add a virtual pore per tagged face
    pub add_virtual_pores: bool,
    /// Keep distance map, smoothed map, markers and labels in the output
    pub retain_intermediates: bool,
    /// Size of a dedicated worker pool; the global pool when unset
    pub threads: Option<usize>,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            truncate: DEFAULT_TRUNCATE,
            connectivity: Connectivity::default(),
            neighbor_count: None,
            peak_footprint_radius: None,
            saddle_max_iterations: DEFAULT_SADDLE_MAX_ITERATIONS,
            plateau_tolerance: DEFAULT_PLATEAU_TOLERANCE,
            proximity_factor: DEFAULT_PROXIMITY_FACTOR,
            marker_min_distance: DEFAULT_MARKER_MIN_DISTANCE,
            domain_boundary: DomainBoundary::default(),
            conduit_length: ConduitLength::default(),
            boundary_faces: Vec::new(),
            add_virtual_pores: false,
            retain_intermediates: false,
            threads: None,
        }
    }
}

impl SnowConfig {
    /// Set the smoothing sigma
    #[must_use]
    pub const fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the Gaussian truncation
    #[must_use]
    pub const fn with_truncate(mut self, truncate: f64) -> Self {
        self.truncate = truncate;
        self
    }

    /// Set the connectivity
    #[must_use]
    pub const fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self.neighbor_count = None;
        self
    }

    /// Set the connectivity by neighbor count, checked in [`Self::resolve`]
    #[must_use]
    pub const fn with_neighbor_count(mut self, count: usize) -> Self {
        self.neighbor_count = Some(count);
        self
    }

    /// Use a ball footprint of the given radius for peak detection
    #[must_use]
    pub const fn with_peak_footprint_radius(mut self, radius: f64) -> Self {
        self.peak_footprint_radius = Some(radius);
        self
    }

    /// Set the saddle test iteration limit
    #[must_use]
    pub const fn with_saddle_max_iterations(mut self, iterations: usize) -> Self {
        self.saddle_max_iterations = iterations;
        self
    }

    /// Set the plateau tolerance
    #[must_use]
    pub const fn with_plateau_tolerance(mut self, tolerance: f64) -> Self {
        self.plateau_tolerance = tolerance;
        self
    }

    /// Set the proximity factor
    #[must_use]
    pub const fn with_proximity_factor(mut self, factor: f64) -> Self {
        self.proximity_factor = factor;
        self
    }

    /// Set the minimum marker distance
    #[must_use]
    pub const fn with_marker_min_distance(mut self, distance: f64) -> Self {
        self.marker_min_distance = distance;
        self
    }

    /// Set the domain boundary mode
    #[must_use]
    pub const fn with_domain_boundary(mut self, boundary: DomainBoundary) -> Self {
        self.domain_boundary = boundary;
        self
    }

    /// Set the conduit length rule
    #[must_use]
    pub const fn with_conduit_length(mut self, mode: ConduitLength) -> Self {
        self.conduit_length = mode;
        self
    }

    /// Tag the named faces
    #[must_use]
    pub fn with_boundary_faces<I, S>(mut self, faces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boundary_faces = faces.into_iter().map(Into::into).collect();
        self
    }

    /// Add virtual pores for tagged faces
    #[must_use]
    pub const fn with_virtual_pores(mut self, enabled: bool) -> Self {
        self.add_virtual_pores = enabled;
        self
    }

    /// Keep intermediate arrays in the output
    #[must_use]
    pub const fn with_intermediates(mut self, retain: bool) -> Self {
        self.retain_intermediates = retain;
        self
    }

    /// Run on a dedicated pool of the given size
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Load a configuration from a JSON file; missing keys take defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SnowError::FileSystem {
            path: path.to_path_buf(),
            operation: "read configuration",
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SnowError::Serialization {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every parameter that does not depend on the field
    ///
    /// Face names are parsed here; whether a face exists in the field's
    /// dimensionality is left to [`Self::resolve`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for the first invalid parameter
    pub fn validate(&self) -> Result<()> {
        non_negative("sigma", self.sigma)?;
        non_negative("plateau_tolerance", self.plateau_tolerance)?;
        non_negative("proximity_factor", self.proximity_factor)?;
        non_negative("marker_min_distance", self.marker_min_distance)?;

        if !self.truncate.is_finite() || self.truncate <= 0.0 {
            return Err(configuration_error(
                "truncate",
                &self.truncate,
                &"must be a finite number greater than zero",
            ));
        }
        if let Some(radius) = self.peak_footprint_radius
            && (!radius.is_finite() || radius <= 1.0)
        {
            return Err(configuration_error(
                "peak_footprint_radius",
                &radius,
                &"must be a finite number greater than one voxel",
            ));
        }
        for name in &self.boundary_faces {
            name.parse::<Face>()?;
        }
        if self.threads == Some(0) {
            return Err(configuration_error(
                "threads",
                &0,
                &"a worker pool needs at least one thread",
            ));
        }
        Ok(())
    }

    /// Validate and resolve dimension-dependent settings for a field
    ///
    /// # Errors
    ///
    /// Returns a configuration error if validation fails, the neighbor count
    /// is not supported for `ndim`, or a face name is unknown or absent in
    /// `ndim` dimensions
    pub fn resolve(&self, ndim: usize) -> Result<ResolvedConfig> {
        self.validate()?;

        let connectivity = match self.neighbor_count {
            Some(count) => Connectivity::from_neighbor_count(ndim, count)?,
            None => self.connectivity,
        };
        let faces = self
            .boundary_faces
            .iter()
            .map(|name| Face::parse_for(name, ndim))
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedConfig {
            marker: MarkerParams {
                sigma: self.sigma,
                truncate: self.truncate,
                connectivity,
                peak_footprint_radius: self.peak_footprint_radius,
                saddle_max_iterations: self.saddle_max_iterations,
                plateau_tolerance: self.plateau_tolerance,
                proximity_factor: self.proximity_factor,
                min_distance: self.marker_min_distance,
            },
            connectivity,
            domain_boundary: self.domain_boundary,
            conduit_length: self.conduit_length,
            boundary: BoundaryOptions {
                faces,
                add_virtual_pores: self.add_virtual_pores,
            },
            retain_intermediates: self.retain_intermediates,
        })
    }
}

/// Settings checked against a specific field dimensionality
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Marker extraction parameters
    pub marker: MarkerParams,
    /// Adjacency used for flooding
    pub connectivity: Connectivity,
    /// Interpretation of the outside of the domain
    pub domain_boundary: DomainBoundary,
    /// Conduit length rule
    pub conduit_length: ConduitLength,
    /// Face tagging settings
    pub boundary: BoundaryOptions,
    /// Keep intermediates in the output
    pub retain_intermediates: bool,
}

fn non_negative(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(configuration_error(
            parameter,
            &value,
            &"must be a finite number, zero or greater",
        ))
    }
}
