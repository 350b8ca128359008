//! Marker extraction: one seed voxel per pore
//!
//! The distance map is smoothed, its local maxima are found, plateaus and
//! saddle points are trimmed, and finally markers inside a larger pore's
//! inscribed sphere are suppressed. Survivors receive labels `1..=n` in
//! ascending linear-index order.

use crate::algorithm::peaks::find_peaks;
use crate::algorithm::proximity::{PeakCandidate, ProximityRule, trim_nearby_peaks};
use crate::algorithm::saddle::{classify_plateaus, group_plateaus, representative};
use crate::math::distance::DistanceMap;
use crate::math::gaussian::gaussian_filter;
use crate::spatial::field::VoxelField;
use crate::spatial::grid::{Coord, Grid, flat};
use crate::spatial::neighborhood::{Connectivity, Neighborhood};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seed voxel of one pore region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Region label, at least 1
    pub label: u32,
    /// Linear index of the seed voxel
    pub index: usize,
    /// Coordinates of the seed voxel
    pub coords: Coord,
    /// Smoothed distance at the seed
    pub height: f64,
    /// Unsmoothed distance at the seed, in voxels
    pub inscribed_radius: f64,
}

/// Ordered collection of markers keyed by label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    /// Empty set
    pub const fn new() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    /// Label seed voxels `1..=n` in the order given
    pub fn from_indices(indices: &[usize], grid: &Grid, smoothed: &[f64], distance: &DistanceMap) -> Self {
        let mut set = Self::new();
        for &index in indices {
            set.push(index, grid, smoothed, distance);
        }
        set
    }

    /// Append a marker with the next free label and return that label
    pub fn push(&mut self, index: usize, grid: &Grid, smoothed: &[f64], distance: &DistanceMap) -> u32 {
        let label = self.next_label();
        self.markers.push(Marker {
            label,
            index,
            coords: grid.coords(index),
            height: smoothed.get(index).copied().unwrap_or(0.0),
            inscribed_radius: distance.at(index),
        });
        label
    }

    /// Label the next pushed marker would receive
    pub fn next_label(&self) -> u32 {
        self.markers.last().map_or(1, |m| m.label + 1)
    }

    /// Marker with the given label
    pub fn get(&self, label: u32) -> Option<&Marker> {
        let position = (label as usize).checked_sub(1)?;
        self.markers.get(position).filter(|m| m.label == label)
    }

    /// Markers in label order
    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    /// Iterate markers in label order
    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    /// Number of markers
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether there are no markers
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl<'a> IntoIterator for &'a MarkerSet {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Number of markers surviving each trimming step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCounts {
    /// Raw local-maximum voxels, plateau members counted individually
    pub candidate_voxels: usize,
    /// Distinct plateaus among the candidates
    pub initial_peaks: usize,
    /// Plateaus kept by the saddle test
    pub after_saddle_trim: usize,
    /// Markers kept by proximity trimming
    pub after_proximity_trim: usize,
}

/// Parameters of marker extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerParams {
    /// Gaussian sigma in voxels; 0 disables smoothing
    pub sigma: f64,
    /// Gaussian kernel truncation in standard deviations
    pub truncate: f64,
    /// Adjacency used for plateau grouping and as the default peak footprint
    pub connectivity: Connectivity,
    /// Ball radius of the peak footprint, overriding `connectivity` when set
    pub peak_footprint_radius: Option<f64>,
    /// Dilation steps allowed per plateau in the saddle test
    pub saddle_max_iterations: usize,
    /// Tolerance for treating smoothed values as equal
    pub plateau_tolerance: f64,
    /// Proximity suppression radius as a multiple of peak height
    pub proximity_factor: f64,
    /// Absolute minimum marker separation in voxels
    pub min_distance: f64,
}

/// Result of marker extraction
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerExtraction {
    /// Smoothed distance map, reused as the watershed elevation
    pub smoothed: ArrayD<f64>,
    /// Surviving markers, labeled in ascending index order
    pub markers: MarkerSet,
    /// Survivor counts per trimming step
    pub counts: MarkerCounts,
}

/// Finds, trims and labels pore markers
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    params: MarkerParams,
}

impl MarkerExtractor {
    /// Create an extractor
    pub const fn new(params: MarkerParams) -> Self {
        Self { params }
    }

    /// Parameters in use
    pub const fn params(&self) -> &MarkerParams {
        &self.params
    }

    /// Smooth the distance map, forcing background voxels back to zero
    pub fn smooth(&self, distance: &DistanceMap, field: &VoxelField) -> ArrayD<f64> {
        let mut smoothed = gaussian_filter(distance.values(), self.params.sigma, self.params.truncate);
        smoothed
            .iter_mut()
            .zip(field.as_slice())
            .filter(|&(_, &foreground)| !foreground)
            .for_each(|(value, _)| *value = 0.0);
        smoothed
    }

    /// Run the full marker extraction on a field and its distance map
    pub fn extract(&self, distance: &DistanceMap, field: &VoxelField) -> MarkerExtraction {
        let grid = field.grid();
        let mask = field.as_slice();
        let smoothed = self.smooth(distance, field);
        let values = flat(&smoothed);

        let connectivity = Neighborhood::new(grid.ndim(), self.params.connectivity);
        let footprint = self
            .params
            .peak_footprint_radius
            .map_or_else(|| connectivity.clone(), |r| Neighborhood::ball(grid.ndim(), r));

        let candidates = find_peaks(values, mask, grid, &footprint, self.params.plateau_tolerance);
        let plateaus = group_plateaus(&candidates, values, grid, &connectivity);
        debug!(
            candidates = candidates.len(),
            plateaus = plateaus.len(),
            "local maxima found"
        );

        let verdicts = classify_plateaus(
            &plateaus,
            values,
            mask,
            grid,
            self.params.saddle_max_iterations,
            self.params.plateau_tolerance,
        );
        let peaks: Vec<PeakCandidate> = plateaus
            .iter()
            .zip(&verdicts)
            .filter(|&(_, verdict)| verdict.is_kept())
            .filter_map(|(plateau, _)| {
                representative(plateau, grid).map(|index| PeakCandidate {
                    index,
                    height: plateau.height,
                })
            })
            .collect();
        debug!(kept = peaks.len(), "saddle points trimmed");

        let rule = ProximityRule {
            factor: self.params.proximity_factor,
            min_distance: self.params.min_distance,
        };
        let accepted = trim_nearby_peaks(&peaks, grid, rule);
        debug!(kept = accepted.len(), "nearby peaks trimmed");

        let counts = MarkerCounts {
            candidate_voxels: candidates.len(),
            initial_peaks: plateaus.len(),
            after_saddle_trim: peaks.len(),
            after_proximity_trim: accepted.len(),
        };
        let markers = MarkerSet::from_indices(&accepted, grid, values, distance);

        MarkerExtraction {
            smoothed,
            markers,
            counts,
        }
    }
}
