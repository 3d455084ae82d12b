use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use starprep_core::config::{RunConfiguration, RunOptions};
use starprep_core::engine::script::ScriptWriter;
use starprep_core::engine::siril::{executable_or_default, SirilCli};
use starprep_core::engine::Engine;
use starprep_core::pipeline::{run_pipeline_reported, RunReport};

use crate::progress::StageProgress;
use crate::summary::{print_run_outcome, print_run_summary};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Camera profile (CANON_DSLR / ZWO_OSC)
    #[arg(short = 'i', long = "camera", value_name = "CAMERA")]
    pub camera: Option<String>,

    /// Base directory holding DARKFLAT, DARK, FLAT and LIGHT
    #[arg(short = 'd', long = "basedir", value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Sequence start number
    #[arg(short = 's', long = "sequencestart", value_name = "N")]
    pub sequence_start: Option<String>,

    /// Master dark file
    #[arg(short = 'a', long = "masterdarkfile", value_name = "FILE")]
    pub master_dark: Option<PathBuf>,

    /// Master bias (offset) file
    #[arg(short = 'b', long = "masterbiasfile", value_name = "FILE")]
    pub master_bias: Option<PathBuf>,

    /// Target name, the subdirectory of LIGHT to process
    #[arg(short = 't', long = "targetname", value_name = "NAME")]
    pub target: Option<String>,

    /// How far to process (reg, stack, preproc)
    #[arg(short = 'p', long = "process", value_name = "DEPTH")]
    pub process: Option<String>,

    /// Filter FWHM
    #[arg(short = 'f', long = "filterfwhm", value_name = "FWHM")]
    pub filter_fwhm: Option<String>,

    /// Filter weighted FWHM
    #[arg(short = 'w', long = "filterwfwhm", value_name = "WFWHM")]
    pub filter_wfwhm: Option<String>,

    /// Filter roundness (0-1)
    #[arg(short = 'r', long = "filterround", value_name = "ROUND")]
    pub filter_round: Option<String>,

    /// Number of CPUs the engine may use
    #[arg(short = 'c', long = "cpu", value_name = "N")]
    pub cpus: Option<String>,

    /// Registration reference frame (first, 2pass, or a frame number)
    #[arg(long, value_name = "REF")]
    pub reference: Option<String>,

    /// Run options file (TOML); command-line flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the siril-cli executable
    #[arg(long, value_name = "PATH")]
    pub siril: Option<PathBuf>,

    /// Write the engine commands to a Siril script instead of running them
    #[arg(long, value_name = "SCRIPT")]
    pub dry_run: Option<PathBuf>,
}

impl RunArgs {
    /// The run options given on the command line alone.
    pub fn cli_options(&self) -> RunOptions {
        RunOptions {
            camera: self.camera.clone(),
            base_dir: self.base_dir.clone(),
            sequence_start: self.sequence_start.clone(),
            master_dark: self.master_dark.clone(),
            master_bias: self.master_bias.clone(),
            target: self.target.clone(),
            process: self.process.clone(),
            filter_fwhm: self.filter_fwhm.clone(),
            filter_wfwhm: self.filter_wfwhm.clone(),
            filter_round: self.filter_round.clone(),
            cpus: self.cpus.clone(),
            reference: self.reference.clone(),
        }
    }

    /// Options from the config file, if any, overridden by the command line.
    pub fn options(&self) -> Result<RunOptions> {
        let base = match self.config {
            Some(ref path) => RunOptions::from_toml_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => RunOptions::default(),
        };
        Ok(base.merged_with(self.cli_options()))
    }

    fn engine(&self) -> Box<dyn Engine> {
        match self.dry_run {
            Some(ref script) => Box::new(ScriptWriter::new(script)),
            None => Box::new(SirilCli::with_executable(executable_or_default(
                self.siril.as_deref(),
            ))),
        }
    }
}

pub fn run(args: &RunArgs, config: &RunConfiguration) -> RunReport {
    let engine = args.engine();
    print_run_summary(config, engine.name());

    let progress = Arc::new(StageProgress::new());
    let report = run_pipeline_reported(config, engine, progress);

    print_run_outcome(&report, args.dry_run.is_some());
    if let Some(ref script) = args.dry_run {
        if report.is_success() {
            println!("  Script written to {}", script.display());
        }
    }
    report
}
