use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{error, info};

use crate::config::{ProcessDepth, RunConfiguration};
use crate::consts::{MASTER_FLAT_FILE, OUTPUT_EXTENSION, SIRIL_REQUIRED_VERSION};
use crate::engine::{Engine, EngineCommand, EngineSession};
use crate::error::{Result, StarprepError};
use crate::frames::{locate, FrameClass, LocatedFrames};
use crate::profile::CameraCapabilities;

use super::finish::{register_lights, stack_lights};
use super::lights::preprocess_lights;
use super::masters::{build_master, MasterFrame};
use super::types::{NoOpReporter, PipelineStage, ProgressReporter, RunReport, StageResult};

/// One pipeline run: the configuration, the open engine session and the
/// stages completed so far.
struct PipelineRun<'r, E: Engine> {
    config: RunConfiguration,
    caps: CameraCapabilities,
    session: EngineSession<E>,
    stages: Vec<StageResult>,
    reporter: &'r dyn ProgressReporter,
}

impl<E: Engine> PipelineRun<'_, E> {
    fn configure_session(&mut self) -> Result<()> {
        let preferences = [
            EngineCommand::Requires(SIRIL_REQUIRED_VERSION.to_string()),
            EngineCommand::Set32Bits,
            EngineCommand::SetExt(OUTPUT_EXTENSION.to_string()),
            EngineCommand::SetCpu(self.config.workers),
        ];
        for command in preferences {
            self.session
                .execute(&command)
                .map_err(|e| StarprepError::engine("session", format!("{}: {e}", command.verb())))?;
        }
        Ok(())
    }

    fn locate(&self, class: FrameClass) -> LocatedFrames {
        locate(
            self.config.camera,
            class,
            &self.config.working_dir,
            &self.config.target,
        )
    }

    /// Run `body` as `stage`, reporting progress and recording the result.
    fn stage<T>(
        &mut self,
        stage: PipelineStage,
        frames: &LocatedFrames,
        output_name: impl Fn(&T) -> String,
        body: impl FnOnce(&mut E, &RunConfiguration) -> Result<T>,
    ) -> Result<T> {
        info!(
            stage = %stage,
            frames = frames.count,
            source = %frames.directory.display(),
            "{}", stage.description()
        );
        self.reporter.begin_stage(stage, frames.count, &frames.directory);

        let outcome = body(&mut *self.session, &self.config);

        let result = StageResult {
            stage,
            frames: frames.count,
            output: outcome.as_ref().ok().map(&output_name),
            error: outcome.as_ref().err().map(ToString::to_string),
        };
        self.reporter.finish_stage(&result);
        self.stages.push(result);
        outcome
    }

    /// Offset master for cameras that need one, unless a bias master was
    /// supplied. Returns the bias master the later stages subtract.
    fn offset_stage(&mut self) -> Result<Option<PathBuf>> {
        if let Some(ref bias) = self.config.master_bias {
            info!(bias = %bias.display(), "Using supplied bias master");
            return Ok(Some(bias.clone()));
        }
        if !self.caps.requires_offset_master {
            return Ok(None);
        }
        let frames = self.locate(FrameClass::Offset);
        let master = MasterFrame::offset();
        self.stage(PipelineStage::OffsetMaster, &frames, path_name, |engine, config| {
            build_master(engine, PipelineStage::OffsetMaster, &master, &frames.directory, config)
        })
        .map(Some)
    }

    /// Flat master. Cameras without an offset stage build their dark-flat
    /// master here first, unless one was supplied.
    fn flat_stage(&mut self, bias: Option<PathBuf>) -> Result<Option<PathBuf>> {
        let stage = PipelineStage::FlatMaster;
        let flats = self.locate(FrameClass::Flat);
        let dark_flats = (bias.is_none() && !self.caps.requires_offset_master)
            .then(|| self.locate(FrameClass::Offset));

        let bias = self.stage(stage, &flats, |_| MASTER_FLAT_FILE.to_string(), |engine, config| {
            let bias = match dark_flats {
                Some(ref dark_flats) => {
                    info!(frames = dark_flats.count, "Building dark-flat master");
                    Some(build_master(
                        engine,
                        stage,
                        &MasterFrame::offset(),
                        &dark_flats.directory,
                        config,
                    )?)
                }
                None => bias,
            };
            build_master(engine, stage, &MasterFrame::flat(bias.clone()), &flats.directory, config)?;
            Ok(bias)
        })?;
        Ok(bias)
    }

    /// Dark master for cameras that build one, unless a dark master was
    /// supplied.
    fn dark_stage(&mut self, bias: Option<PathBuf>) -> Result<Option<PathBuf>> {
        if let Some(ref dark) = self.config.master_dark {
            info!(dark = %dark.display(), "Using supplied dark master");
            return Ok(Some(dark.clone()));
        }
        if !self.caps.builds_dark_master {
            return Ok(None);
        }
        let frames = self.locate(FrameClass::Dark);
        let master = MasterFrame::dark(bias);
        self.stage(PipelineStage::DarkMaster, &frames, path_name, |engine, config| {
            build_master(engine, PipelineStage::DarkMaster, &master, &frames.directory, config)
        })
        .map(Some)
    }

    fn execute(&mut self) -> Result<Option<PathBuf>> {
        self.configure_session()?;
        self.reporter.run_started(&self.config);

        let bias = self.offset_stage()?;
        let bias = self.flat_stage(bias)?;
        let dark = self.dark_stage(bias.clone())?;

        let lights = self.locate(FrameClass::Light);
        let calibrated = self.stage(
            PipelineStage::LightPreprocess,
            &lights,
            String::clone,
            |engine, config| {
                preprocess_lights(
                    engine,
                    config,
                    &lights.directory,
                    bias.as_deref(),
                    dark.as_deref(),
                )
            },
        )?;

        if !self.config.depth.includes(ProcessDepth::Register) {
            return Ok(None);
        }
        let registered = self.stage(
            PipelineStage::Register,
            &lights,
            String::clone,
            |engine, config| register_lights(engine, config, &calibrated),
        )?;

        if !self.config.depth.includes(ProcessDepth::Stack) {
            return Ok(None);
        }
        let stacked = self.stage(PipelineStage::Stack, &lights, path_name, |engine, config| {
            stack_lights(engine, config, &registered, Local::now())
        })?;
        Ok(Some(stacked))
    }
}

#[allow(clippy::ptr_arg)]
fn path_name(path: &PathBuf) -> String {
    path.display().to_string()
}

/// Run the full calibration pipeline with a thread-safe progress reporter.
///
/// The engine is opened first and closed before returning, whichever way the
/// run ends. Stages that ran stay in the report even when a later one failed.
pub fn run_pipeline_reported<E: Engine>(
    config: &RunConfiguration,
    engine: E,
    reporter: Arc<dyn ProgressReporter>,
) -> RunReport {
    let started = Local::now();
    let finish = |stages: Vec<StageResult>,
                  stacked_output: Option<PathBuf>,
                  failure: Option<StarprepError>| {
        if let Some(ref err) = failure {
            error!(error = %err, "Run aborted");
        }
        RunReport {
            started,
            finished: Local::now(),
            stages,
            stacked_output,
            failure,
        }
    };

    let config = match absolute_dirs(config) {
        Ok(config) => config,
        Err(err) => return finish(Vec::new(), None, Some(err)),
    };

    let session = match EngineSession::open(engine) {
        Ok(session) => session,
        Err(e) => {
            return finish(
                Vec::new(),
                None,
                Some(StarprepError::engine("session", e.to_string())),
            )
        }
    };

    info!(
        camera = %config.camera,
        depth = %config.depth,
        working_dir = %config.working_dir.display(),
        target = %config.target,
        "Processing started"
    );

    let mut run = PipelineRun {
        caps: config.capabilities(),
        config,
        session,
        stages: Vec::new(),
        reporter: reporter.as_ref(),
    };
    let outcome = run.execute();
    let stages = std::mem::take(&mut run.stages);
    drop(run);

    match outcome {
        Ok(stacked) => {
            info!(stages = stages.len(), "Processing completed");
            finish(stages, stacked, None)
        }
        Err(err) => finish(stages, None, Some(err)),
    }
}

/// Run the full calibration pipeline.
pub fn run_pipeline<E: Engine>(config: &RunConfiguration, engine: E) -> RunReport {
    let reporter = Arc::new(NoOpReporter);
    run_pipeline_reported(config, engine, reporter)
}

/// The engine changes directory between stages, so every path handed to it
/// must be absolute.
fn absolute_dirs(config: &RunConfiguration) -> Result<RunConfiguration> {
    let absolute = |p: &Path| std::path::absolute(p).map_err(StarprepError::from);
    let mut config = config.clone();
    config.working_dir = absolute(&config.working_dir)?;
    config.master_bias = config.master_bias.as_deref().map(absolute).transpose()?;
    config.master_dark = config.master_dark.as_deref().map(absolute).transpose()?;
    Ok(config)
}
