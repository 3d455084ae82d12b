use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::RunConfiguration;
use crate::error::StarprepError;

/// Pipeline processing stage, used for progress reporting and the run report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    OffsetMaster,
    FlatMaster,
    DarkMaster,
    LightPreprocess,
    Register,
    Stack,
}

impl PipelineStage {
    /// Stable identifier, as used in logs and error messages.
    pub fn id(self) -> &'static str {
        match self {
            Self::OffsetMaster => "offset-master",
            Self::FlatMaster => "flat-master",
            Self::DarkMaster => "dark-master",
            Self::LightPreprocess => "light-preprocess",
            Self::Register => "register",
            Self::Stack => "stack",
        }
    }

    /// Human-readable description for progress output.
    pub fn description(self) -> &'static str {
        match self {
            Self::OffsetMaster => "Building offset master",
            Self::FlatMaster => "Building flat master",
            Self::DarkMaster => "Building dark master",
            Self::LightPreprocess => "Calibrating lights",
            Self::Register => "Registering lights",
            Self::Stack => "Stacking lights",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Outcome of one stage. Kept even when the stage failed.
#[derive(Clone, Debug, PartialEq)]
pub struct StageResult {
    pub stage: PipelineStage,
    /// Raw frames found for the stage's input.
    pub frames: usize,
    /// File or sequence the stage produced, when it succeeded.
    pub output: Option<String>,
    /// Engine message, when the stage failed.
    pub error: Option<String>,
}

impl StageResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    /// Stages in execution order, including the one that failed.
    pub stages: Vec<StageResult>,
    /// The stacked image, when the run went that far.
    pub stacked_output: Option<PathBuf>,
    /// The error that ended the run early.
    pub failure: Option<StarprepError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Ids of the stages that were attempted, in order.
    pub fn stage_ids(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.stage.id()).collect()
    }

    pub fn failed_stage(&self) -> Option<&StageResult> {
        self.stages.iter().find(|s| !s.is_success())
    }

    /// Convert into a `Result`, keeping the stacked output on success.
    pub fn into_result(self) -> Result<Option<PathBuf>, StarprepError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.stacked_output),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// The engine session is configured and the first stage is about to run.
    fn run_started(&self, _config: &RunConfiguration) {}

    /// A stage is starting on `frames` raw frames read from `source`.
    fn begin_stage(&self, _stage: PipelineStage, _frames: usize, _source: &Path) {}

    /// The current stage is finished, successfully or not.
    fn finish_stage(&self, _result: &StageResult) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
