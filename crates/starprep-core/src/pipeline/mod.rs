mod finish;
mod helpers;
mod lights;
mod masters;
mod orchestrator;
mod types;

pub use finish::stacked_filename;
pub use masters::MasterFrame;
pub use orchestrator::{run_pipeline, run_pipeline_reported};
pub use types::{PipelineStage, ProgressReporter, RunReport, StageResult};
