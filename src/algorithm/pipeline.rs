//! End-to-end extraction: distance transform, markers, watershed, graph
//!
//! [`SnowPipeline`] runs the stages in order, times each one, collects
//! recoverable anomalies and reports progress through an optional
//! [`PipelineObserver`]. With a configured thread count every parallel stage
//! runs inside a dedicated rayon pool.

use crate::algorithm::boundary::{BoundaryReport, tag_boundaries};
use crate::algorithm::markers::{MarkerCounts, MarkerExtractor, MarkerSet};
use crate::algorithm::watershed::{LabelImage, WatershedSegmenter};
use crate::analysis::builder::RegionGraphBuilder;
use crate::analysis::graph::PoreNetworkGraph;
use crate::io::configuration::{ResolvedConfig, SnowConfig};
use crate::io::error::{Result, SnowError};
use crate::math::distance::{DistanceMap, euclidean_distance_transform};
use crate::spatial::field::{FieldKind, VoxelField};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Processing stage, used for error context, timings and progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Input and configuration checks
    Validation,
    /// Euclidean distance transform
    DistanceTransform,
    /// Smoothing, peak detection and trimming
    MarkerExtraction,
    /// Marker-seeded flooding
    Watershed,
    /// Node and edge measurement
    RegionGraph,
    /// Boundary face tagging
    BoundaryTagging,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Self; 6] = [
        Self::Validation,
        Self::DistanceTransform,
        Self::MarkerExtraction,
        Self::Watershed,
        Self::RegionGraph,
        Self::BoundaryTagging,
    ];

    /// Lowercase name of the stage
    pub const fn name(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::DistanceTransform => "distance transform",
            Self::MarkerExtraction => "marker extraction",
            Self::Watershed => "watershed",
            Self::RegionGraph => "region graph",
            Self::BoundaryTagging => "boundary tagging",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Recoverable condition met during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    /// The field has only one phase
    DegenerateField {
        /// Which phase is missing
        kind: FieldKind,
    },
    /// A marker's basin holds only the seed voxel
    IsolatedMarker {
        /// Label of the marker
        label: u32,
    },
    /// A foreground component without markers was seeded afresh
    UnseededRegion {
        /// Label given to the new marker
        label: u32,
        /// Voxels in the component
        voxels: usize,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateField { kind } => write!(f, "degenerate field ({kind:?})"),
            Self::IsolatedMarker { label } => write!(f, "marker {label} never grew beyond its seed"),
            Self::UnseededRegion { label, voxels } => {
                write!(f, "component of {voxels} voxels had no marker, seeded as {label}")
            }
        }
    }
}

/// Receives progress notifications from a running pipeline
///
/// All methods default to doing nothing.
pub trait PipelineObserver: Sync {
    /// A stage is about to run
    fn stage_started(&self, _stage: Stage) {}

    /// A stage completed
    fn stage_finished(&self, _stage: Stage, _elapsed: Duration) {}

    /// An anomaly was recorded
    fn anomaly(&self, _anomaly: &Anomaly) {}
}

/// Wall time spent in one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    /// The stage
    pub stage: Stage,
    /// Time spent
    pub elapsed: Duration,
}

/// Run summary
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    /// Phase content of the input
    pub field_kind: FieldKind,
    /// Number of foreground voxels
    pub foreground_voxels: usize,
    /// Markers surviving each trimming step
    pub marker_counts: MarkerCounts,
    /// Markers after rescue of unseeded components
    pub final_markers: usize,
    /// Time per stage, in execution order
    pub stage_timings: Vec<StageTiming>,
    /// Anomalies in the order they were found
    pub anomalies: Vec<Anomaly>,
    /// Result of boundary tagging
    pub boundary: BoundaryReport,
}

impl Diagnostics {
    fn new(field: &VoxelField) -> Self {
        Self {
            field_kind: field.kind(),
            foreground_voxels: field.foreground_count(),
            marker_counts: MarkerCounts::default(),
            final_markers: 0,
            stage_timings: Vec::new(),
            anomalies: Vec::new(),
            boundary: BoundaryReport::default(),
        }
    }

    /// Time spent in a stage, if it ran
    pub fn elapsed(&self, stage: Stage) -> Option<Duration> {
        self.stage_timings
            .iter()
            .find(|timing| timing.stage == stage)
            .map(|timing| timing.elapsed)
    }

    /// Total time over all stages
    pub fn total_elapsed(&self) -> Duration {
        self.stage_timings.iter().map(|timing| timing.elapsed).sum()
    }
}

/// Arrays produced on the way to the network
#[derive(Debug, Clone, PartialEq)]
pub struct Intermediates {
    /// Raw distance map
    pub distance: DistanceMap,
    /// Smoothed distance map
    pub smoothed: ArrayD<f64>,
    /// Final markers, including rescued ones
    pub markers: MarkerSet,
    /// Region labels
    pub labels: LabelImage,
}

/// Everything a run produces
#[derive(Debug, Clone, PartialEq)]
pub struct SnowOutput {
    /// The extracted network
    pub network: PoreNetworkGraph,
    /// Run summary
    pub diagnostics: Diagnostics,
    /// Intermediate arrays, when retained
    pub intermediates: Option<Intermediates>,
}

/// Configured extraction pipeline
pub struct SnowPipeline<'a> {
    config: SnowConfig,
    observer: Option<&'a dyn PipelineObserver>,
}

impl fmt::Debug for SnowPipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowPipeline")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl<'a> SnowPipeline<'a> {
    /// Create a pipeline after checking the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any parameter is invalid
    pub fn new(config: SnowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: None,
        })
    }

    /// Attach an observer for progress notifications
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn PipelineObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Configuration in use
    pub const fn config(&self) -> &SnowConfig {
        &self.config
    }

    /// Extract the pore network of a field
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A face name or neighbor count is invalid for the field's dimensionality
    /// - The dedicated worker pool cannot be created
    pub fn run(&self, field: &VoxelField) -> Result<SnowOutput> {
        let mut diagnostics = Diagnostics::new(field);
        let resolved = self.timed(&mut diagnostics, Stage::Validation, || {
            self.config.resolve(field.ndim())
        })?;

        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|source| SnowError::ThreadPool { threads, source })?;
                Ok(pool.install(|| self.execute(field, &resolved, diagnostics)))
            }
            None => Ok(self.execute(field, &resolved, diagnostics)),
        }
    }

    fn execute(&self, field: &VoxelField, resolved: &ResolvedConfig, mut diagnostics: Diagnostics) -> SnowOutput {
        info!(
            shape = ?field.shape(),
            foreground = diagnostics.foreground_voxels,
            "extracting pore network"
        );
        let kind = diagnostics.field_kind;
        if kind != FieldKind::Mixed {
            self.record(&mut diagnostics, Anomaly::DegenerateField { kind });
        }

        let distance = self.timed(&mut diagnostics, Stage::DistanceTransform, || {
            euclidean_distance_transform(field, resolved.domain_boundary)
        });

        let extraction = self.timed(&mut diagnostics, Stage::MarkerExtraction, || {
            MarkerExtractor::new(resolved.marker).extract(&distance, field)
        });
        diagnostics.marker_counts = extraction.counts;
        info!(
            candidates = extraction.counts.candidate_voxels,
            peaks = extraction.counts.initial_peaks,
            after_saddle = extraction.counts.after_saddle_trim,
            markers = extraction.counts.after_proximity_trim,
            "markers extracted"
        );

        let smoothed = extraction.smoothed;
        let mut markers = extraction.markers;
        let segmentation = self.timed(&mut diagnostics, Stage::Watershed, || {
            WatershedSegmenter::new(field.ndim(), resolved.connectivity).segment(
                &smoothed,
                field.as_slice(),
                &mut markers,
                &distance,
            )
        });
        for rescued in &segmentation.rescued {
            self.record(
                &mut diagnostics,
                Anomaly::UnseededRegion {
                    label: rescued.label,
                    voxels: rescued.voxels,
                },
            );
        }
        for &label in &segmentation.isolated {
            self.record(&mut diagnostics, Anomaly::IsolatedMarker { label });
        }
        diagnostics.final_markers = markers.len();

        let labels = segmentation.labels;
        let mut network = self.timed(&mut diagnostics, Stage::RegionGraph, || {
            RegionGraphBuilder::new(field.voxel_size(), resolved.conduit_length).build(
                &labels,
                &markers,
                &distance,
                &segmentation.isolated,
            )
        });
        info!(
            pores = network.node_count(),
            throats = network.edge_count(),
            "network built"
        );

        if !resolved.boundary.faces.is_empty() {
            let report = self.timed(&mut diagnostics, Stage::BoundaryTagging, || {
                tag_boundaries(&mut network, &labels, &distance, &resolved.boundary)
            });
            diagnostics.boundary = report;
        }

        let intermediates = resolved.retain_intermediates.then(|| Intermediates {
            distance,
            smoothed,
            markers,
            labels,
        });

        SnowOutput {
            network,
            diagnostics,
            intermediates,
        }
    }

    fn timed<T>(&self, diagnostics: &mut Diagnostics, stage: Stage, work: impl FnOnce() -> T) -> T {
        if let Some(observer) = self.observer {
            observer.stage_started(stage);
        }
        let started = Instant::now();
        let output = work();
        let elapsed = started.elapsed();

        diagnostics.stage_timings.push(StageTiming { stage, elapsed });
        info!(%stage, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "stage finished");
        if let Some(observer) = self.observer {
            observer.stage_finished(stage, elapsed);
        }
        output
    }

    fn record(&self, diagnostics: &mut Diagnostics, anomaly: Anomaly) {
        warn!(%anomaly, "anomaly");
        if let Some(observer) = self.observer {
            observer.anomaly(&anomaly);
        }
        diagnostics.anomalies.push(anomaly);
    }
}

/// Run the pipeline once with the given configuration
///
/// # Errors
///
/// Returns an error if the configuration is invalid for the field or the
/// worker pool cannot be created
pub fn extract_network(field: &VoxelField, config: &SnowConfig) -> Result<PoreNetworkGraph> {
    let pipeline = SnowPipeline::new(config.clone())?;
    Ok(pipeline.run(field)?.network)
}
