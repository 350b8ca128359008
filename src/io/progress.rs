//! Multi-file progress tracking with automatic batching for large sets

use crate::algorithm::pipeline::{Anomaly, PipelineObserver, Stage};
use crate::io::configuration::{MAX_INDIVIDUAL_PROGRESS_BARS, PROGRESS_BAR_WIDTH};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{prefix:>20}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:40.green/white}] {pos}/{len} files ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Coordinates progress display for batch operations
///
/// Each file gets a bar stepping through the pipeline stages. Large batches
/// add a single batch bar and recycle the file bars.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    file_bars: Vec<ProgressBar>,
    file_count: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            file_bars: Vec::new(),
            file_count: 0,
        }
    }

    /// Initialize progress bars based on file count
    pub fn initialize(&mut self, file_count: usize) {
        self.file_count = file_count;

        // Switch to batch mode for large file sets to avoid terminal spam
        if file_count > MAX_INDIVIDUAL_PROGRESS_BARS {
            let batch_bar = ProgressBar::new(file_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            batch_bar.set_message("Extracting");
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        for _ in 0..file_count.min(MAX_INDIVIDUAL_PROGRESS_BARS) {
            let bar = ProgressBar::new(Stage::ALL.len() as u64);
            bar.set_style(STAGE_STYLE.clone());
            self.file_bars.push(self.multi_progress.add(bar));
        }
    }

    /// Number of files being tracked
    pub const fn file_count(&self) -> usize {
        self.file_count
    }

    /// Observer reporting stage progress for the file at `index`
    pub fn start_file(&self, index: usize, path: &Path) -> FileProgress {
        let bar = self
            .file_bars
            .get(index % MAX_INDIVIDUAL_PROGRESS_BARS)
            .cloned()
            .unwrap_or_else(ProgressBar::hidden);
        bar.reset();
        bar.set_length(Stage::ALL.len() as u64);
        bar.set_prefix(
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
        );
        bar.set_message("starting");
        FileProgress { bar }
    }

    /// Mark a file as completed and update batch progress
    pub fn complete_file(&self, progress: &FileProgress, elapsed: Duration) {
        progress.bar.set_position(Stage::ALL.len() as u64);
        progress
            .bar
            .set_message(format!("✓ {:.2}s", elapsed.as_secs_f64()));
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All files processed");
        }
        let _ = self.multi_progress.clear();
    }
}

/// Stage progress of one file
pub struct FileProgress {
    bar: ProgressBar,
}

impl FileProgress {
    /// Progress that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Stages completed so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Current status message
    pub fn message(&self) -> String {
        self.bar.message().to_string()
    }
}

impl PipelineObserver for FileProgress {
    fn stage_started(&self, stage: Stage) {
        self.bar.set_message(stage.to_string());
    }

    fn stage_finished(&self, _stage: Stage, _elapsed: Duration) {
        self.bar.inc(1);
    }

    fn anomaly(&self, anomaly: &Anomaly) {
        self.bar.set_message(format!("warning: {anomaly}"));
    }
}
