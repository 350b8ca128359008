//! Tests for progress tracking and multi-file batch processing

#[cfg(test)]
mod tests {
    use snowpore::algorithm::pipeline::{Anomaly, PipelineObserver, Stage};
    use snowpore::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
    use snowpore::io::progress::{FileProgress, ProgressManager};
    use std::path::Path;
    use std::time::Duration;

    // Tests a single-file run from initialization to cleanup
    // Verified by leaving bars registered after cleanup
    #[test]
    fn test_single_file_lifecycle() {
        let mut pm = ProgressManager::new();
        pm.initialize(1);
        assert_eq!(pm.file_count(), 1);

        let progress = pm.start_file(0, Path::new("rock.png"));
        assert_eq!(progress.position(), 0);
        assert_eq!(progress.message(), "starting");

        pm.complete_file(&progress, Duration::from_millis(1500));
        assert_eq!(progress.position(), Stage::ALL.len() as u64);
        assert!(progress.message().contains("1.50s"));
        pm.finish();
    }

    // Tests that stage notifications advance the bar one step each
    // Verified by advancing only on the final stage
    #[test]
    fn test_observer_advances_per_stage() {
        let progress = FileProgress::hidden();
        for stage in [Stage::Validation, Stage::DistanceTransform] {
            progress.stage_started(stage);
            assert_eq!(progress.message(), stage.to_string());
            progress.stage_finished(stage, Duration::from_millis(5));
        }
        assert_eq!(progress.position(), 2);

        progress.anomaly(&Anomaly::IsolatedMarker { label: 3 });
        assert!(progress.message().starts_with("warning"));
    }

    // Tests bar recycling once the batch exceeds the individual bar limit
    // Verified by creating one bar per file regardless of batch size
    #[test]
    fn test_large_batches_recycle_bars() {
        let mut pm = ProgressManager::default();
        let count = MAX_INDIVIDUAL_PROGRESS_BARS + 3;
        pm.initialize(count);
        assert_eq!(pm.file_count(), count);

        for index in 0..count {
            let name = format!("slice_{index}.png");
            let progress = pm.start_file(index, Path::new(&name));
            progress.stage_started(Stage::Watershed);
            pm.complete_file(&progress, Duration::from_millis(10));
        }
        pm.finish();
    }

    // Tests that an uninitialized manager still hands out working observers
    // Verified by returning None before initialize
    #[test]
    fn test_start_without_initialize() {
        let pm = ProgressManager::new();
        let progress = pm.start_file(4, Path::new("late.png"));
        progress.stage_finished(Stage::RegionGraph, Duration::ZERO);
        assert_eq!(progress.position(), 1);
    }
}
