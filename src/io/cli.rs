//! Command-line interface for batch pore-network extraction from PNG images

use crate::algorithm::pipeline::SnowPipeline;
use crate::analysis::graph::ConduitLength;
use crate::io::configuration::{DEFAULT_COLOR_SEED, LABELS_SUFFIX, NETWORK_SUFFIX, SnowConfig};
use crate::io::error::{Result, SnowError};
use crate::io::export::write_network_json;
use crate::io::image::{DEFAULT_GREY_THRESHOLD, export_label_png, load_png_field, load_png_stack, png_files_in};
use crate::io::progress::{FileProgress, ProgressManager};
use crate::math::distance::DomainBoundary;
use crate::spatial::field::VoxelField;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "snowpore")]
#[command(
    author,
    version,
    about = "Extract pore networks from binary images with the SNOW algorithm"
)]
/// Command-line arguments for the extraction tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input PNG file, directory of PNG files, or slice directory with --stack
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Treat TARGET as a directory of slices forming one 3D field
    #[arg(long)]
    pub stack: bool,

    /// Physical edge length of one voxel
    #[arg(short = 's', long, default_value_t = 1.0)]
    pub voxel_size: f64,

    /// Grey level above which a pixel is pore space
    #[arg(short = 't', long, default_value_t = DEFAULT_GREY_THRESHOLD)]
    pub threshold: u8,

    /// JSON configuration file; command-line options override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gaussian smoothing sigma in voxels
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Neighbor count (4 or 8 in 2D, 6, 18 or 26 in 3D)
    #[arg(long)]
    pub connectivity: Option<usize>,

    /// Proximity suppression radius as a multiple of peak height
    #[arg(long)]
    pub proximity_factor: Option<f64>,

    /// Minimum marker separation in voxels
    #[arg(long)]
    pub min_distance: Option<f64>,

    /// Faces to tag as boundaries (comma separated: left,right,front,back,bottom,top)
    #[arg(short, long, value_delimiter = ',')]
    pub faces: Vec<String>,

    /// Add a virtual pore per tagged face
    #[arg(long)]
    pub virtual_pores: bool,

    /// Ignore the domain edge in the distance transform
    #[arg(long)]
    pub open_boundary: bool,

    /// Measure conduit lengths between pore surfaces instead of centroids
    #[arg(long)]
    pub surface_conduits: bool,

    /// Worker threads (defaults to all cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Also write a colour PNG of the region labels
    #[arg(short, long)]
    pub labels: bool,

    /// Seed for the label colour permutation
    #[arg(long, default_value_t = DEFAULT_COLOR_SEED)]
    pub seed: u64,

    /// Directory for outputs (defaults to next to each input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Process inputs even if output exists
    #[arg(short, long)]
    pub no_skip: bool,
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Extraction settings from the config file and command-line overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or the result is invalid
    pub fn snow_config(&self) -> Result<SnowConfig> {
        let mut config = match &self.config {
            Some(path) => SnowConfig::from_json_file(path)?,
            None => SnowConfig::default(),
        };

        if let Some(sigma) = self.sigma {
            config = config.with_sigma(sigma);
        }
        if let Some(count) = self.connectivity {
            config = config.with_neighbor_count(count);
        }
        if let Some(factor) = self.proximity_factor {
            config = config.with_proximity_factor(factor);
        }
        if let Some(distance) = self.min_distance {
            config = config.with_marker_min_distance(distance);
        }
        if !self.faces.is_empty() {
            config = config.with_boundary_faces(self.faces.iter().cloned());
        }
        if self.virtual_pores {
            config = config.with_virtual_pores(true);
        }
        if self.open_boundary {
            config = config.with_domain_boundary(DomainBoundary::Open);
        }
        if self.surface_conduits {
            config = config.with_conduit_length(ConduitLength::SurfaceToSurface);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        if self.labels {
            config = config.with_intermediates(true);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Orchestrates batch extraction with progress tracking
pub struct FileProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Process inputs according to CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, target validation or any extraction fails
    pub fn process(&mut self) -> Result<()> {
        let config = self.cli.snow_config()?;
        let inputs = self.collect_inputs()?;

        if inputs.is_empty() {
            return Ok(());
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(inputs.len());
        }

        for (index, input) in inputs.iter().enumerate() {
            self.process_input(input, index, &config)?;
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        Ok(())
    }

    /// Inputs to process, skipping those with existing outputs
    ///
    /// # Errors
    ///
    /// Returns an error if the target is neither a PNG file nor a directory
    pub fn collect_inputs(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.target;
        let candidates = if self.cli.stack {
            if !target.is_dir() {
                return Err(target_error(target, "--stack needs a directory of PNG slices"));
            }
            vec![target.clone()]
        } else if target.is_file() {
            if target.extension().and_then(|s| s.to_str()) != Some("png") {
                return Err(target_error(target, "target file must be a PNG image"));
            }
            vec![target.clone()]
        } else if target.is_dir() {
            png_files_in(target)?
                .into_iter()
                .filter(|path| !is_label_output(path))
                .collect()
        } else {
            return Err(target_error(target, "target must be a PNG file or directory"));
        };

        Ok(candidates
            .into_iter()
            .filter(|input| self.should_process(input))
            .collect())
    }

    fn should_process(&self, input: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }
        let output = self.network_path(input);
        if output.exists() {
            info!(input = %input.display(), "skipping, output exists");
            false
        } else {
            true
        }
    }

    fn load(&self, input: &Path) -> Result<VoxelField> {
        if self.cli.stack {
            load_png_stack(input, self.cli.threshold, self.cli.voxel_size)
        } else {
            load_png_field(input, self.cli.threshold, self.cli.voxel_size)
        }
    }

    fn process_input(&self, input: &Path, index: usize, config: &SnowConfig) -> Result<()> {
        let start_time = Instant::now();
        let progress = self
            .progress_manager
            .as_ref()
            .map_or_else(FileProgress::hidden, |pm| pm.start_file(index, input));

        let field = self.load(input)?;
        let pipeline = SnowPipeline::new(config.clone())?.with_observer(&progress);
        let output = pipeline.run(&field)?;

        let network_path = self.network_path(input);
        write_network_json(&output.network, &network_path)?;

        if self.cli.labels
            && let Some(intermediates) = &output.intermediates
        {
            export_label_png(
                &intermediates.labels,
                &self.output_path(input, LABELS_SUFFIX),
                self.cli.seed,
            )?;
        }

        info!(
            input = %input.display(),
            pores = output.network.node_count(),
            throats = output.network.edge_count(),
            elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "network written to {}",
            network_path.display()
        );
        if let Some(ref pm) = self.progress_manager {
            pm.complete_file(&progress, start_time.elapsed());
        }
        Ok(())
    }

    /// Path of the network table for an input
    pub fn network_path(&self, input: &Path) -> PathBuf {
        self.output_path(input, NETWORK_SUFFIX)
    }

    fn output_path(&self, input: &Path, suffix: &str) -> PathBuf {
        let stem = input.file_stem().unwrap_or_default();
        let name = format!("{}{suffix}", stem.to_string_lossy());
        match (&self.cli.output, input.parent()) {
            (Some(directory), _) => directory.join(name),
            (None, Some(parent)) => parent.join(name),
            (None, None) => PathBuf::from(name),
        }
    }
}

/// Label images written by an earlier run are outputs, not inputs
fn is_label_output(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(LABELS_SUFFIX))
}

fn target_error(target: &Path, reason: &str) -> SnowError {
    SnowError::FileSystem {
        path: target.to_path_buf(),
        operation: "resolve target",
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, reason.to_string()),
    }
}
