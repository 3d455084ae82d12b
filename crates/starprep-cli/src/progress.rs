use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use starprep_core::pipeline::{PipelineStage, ProgressReporter, StageResult};

/// One spinner per stage. The engine reports no intermediate progress, so a
/// spinner with the elapsed time is all there is to show.
pub struct StageProgress {
    current: Mutex<Option<ProgressBar>>,
}

impl StageProgress {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl Default for StageProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StageProgress {
    fn begin_stage(&self, stage: PipelineStage, frames: usize, source: &Path) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg} [{elapsed}]")
        {
            pb.set_style(style);
        }
        pb.set_message(format!(
            "{} ({} frames from {})",
            stage.description(),
            frames,
            source.display()
        ));
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn finish_stage(&self, result: &StageResult) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        let Some(pb) = current.take() else {
            return;
        };
        if result.is_success() {
            pb.finish_with_message(format!(
                "{} {} ({} frames)",
                style("\u{2713}").green(),
                result.stage.description(),
                result.frames
            ));
        } else {
            pb.abandon_with_message(format!(
                "{} {} failed",
                style("\u{2717}").red(),
                result.stage.description()
            ));
        }
    }
}
