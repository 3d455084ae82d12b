use std::path::{Path, PathBuf};
use std::sync::Mutex;

use starprep_core::config::{RunConfiguration, RunOptions};
use starprep_core::engine::{Engine, EngineCommand, EngineError, StackParams};
use starprep_core::pipeline::{PipelineStage, ProgressReporter, StageResult};
use tempfile::TempDir;

/// In-memory engine that records every command and mimics how Siril treats
/// directories: `cd` fails on a missing directory, `convert` fails when the
/// current directory holds no files and creates its output directory.
#[derive(Default)]
pub struct RecordingEngine {
    pub commands: Vec<EngineCommand>,
    /// Verbs answered with `EngineError::Unsupported`.
    pub unsupported: Vec<&'static str>,
    /// Verbs answered with `EngineError::Failed`.
    pub failing: Vec<&'static str>,
    pub fail_open: bool,
    pub opened: usize,
    pub closed: usize,
    cwd: Option<PathBuf>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands other than session preferences.
    pub fn operations(&self) -> Vec<&EngineCommand> {
        self.commands.iter().filter(|c| !c.is_preference()).collect()
    }

    pub fn stacks(&self) -> Vec<&StackParams> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                EngineCommand::Stack(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Rendered script lines, in order.
    pub fn script(&self) -> Vec<String> {
        self.commands.iter().map(ToString::to_string).collect()
    }

    /// Position of the first rendered command starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.script().iter().position(|l| l.starts_with(prefix))
    }
}

impl Engine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn open(&mut self) -> Result<(), EngineError> {
        if self.fail_open {
            return Err(EngineError::Unavailable("siril-cli not found".into()));
        }
        self.opened += 1;
        Ok(())
    }

    fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        self.commands.push(command.clone());
        let verb = command.verb();
        if self.unsupported.contains(&verb) {
            return Err(EngineError::Unsupported(verb.to_string()));
        }
        if self.failing.contains(&verb) {
            return Err(EngineError::Failed(format!("{verb} failed")));
        }
        match command {
            EngineCommand::Cd(dir) => {
                if !dir.is_dir() {
                    return Err(EngineError::Failed(format!(
                        "Error: cannot change directory to {}",
                        dir.display()
                    )));
                }
                self.cwd = Some(dir.clone());
            }
            EngineCommand::Convert { out, .. } => {
                let has_files = self
                    .cwd
                    .as_ref()
                    .and_then(|d| std::fs::read_dir(d).ok())
                    .is_some_and(|mut entries| entries.next().is_some());
                if !has_files {
                    return Err(EngineError::Failed("Error: no file to convert".into()));
                }
                std::fs::create_dir_all(out).map_err(|e| EngineError::Failed(e.to_string()))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}

/// Reporter that remembers which stages began and how they finished.
#[derive(Default)]
pub struct RecordingReporter {
    pub started: Mutex<Vec<(PipelineStage, usize)>>,
    pub finished: Mutex<Vec<StageResult>>,
    pub run_started: Mutex<usize>,
}

impl ProgressReporter for RecordingReporter {
    fn run_started(&self, _config: &RunConfiguration) {
        *self.run_started.lock().unwrap() += 1;
    }

    fn begin_stage(&self, stage: PipelineStage, frames: usize, _source: &Path) {
        self.started.lock().unwrap().push((stage, frames));
    }

    fn finish_stage(&self, result: &StageResult) {
        self.finished.lock().unwrap().push(result.clone());
    }
}

/// A night's capture directory with `count` raw files in each class.
pub fn night_dir(extension: &str, target: &str, count: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for sub in ["DARKFLAT", "DARK", "FLAT"] {
        fill(&dir.path().join(sub), sub, extension, count);
    }
    fill(&dir.path().join("LIGHT").join(target), "light", extension, count);
    dir
}

pub fn fill(dir: &Path, stem: &str, extension: &str, count: usize) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 1..=count {
        std::fs::write(dir.join(format!("{stem}_{i:04}.{extension}")), b"raw").unwrap();
    }
}

/// Resolve a configuration rooted at `root` from `(field, value)` pairs.
pub fn config(root: &Path, pairs: &[(&str, &str)]) -> RunConfiguration {
    let mut options = RunOptions {
        base_dir: Some(root.to_path_buf()),
        ..Default::default()
    };
    for (field, value) in pairs {
        let value = Some(value.to_string());
        match *field {
            "camera" => options.camera = value,
            "target" => options.target = value,
            "process" => options.process = value,
            "filter_fwhm" => options.filter_fwhm = value,
            "filter_wfwhm" => options.filter_wfwhm = value,
            "filter_round" => options.filter_round = value,
            "cpus" => options.cpus = value,
            "sequence_start" => options.sequence_start = value,
            "reference" => options.reference = value,
            "master_bias" => options.master_bias = value.map(PathBuf::from),
            "master_dark" => options.master_dark = value.map(PathBuf::from),
            other => panic!("unknown option {other}"),
        }
    }
    RunConfiguration::resolve(&options, root).unwrap()
}
