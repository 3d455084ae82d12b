use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::info;

use crate::config::{ReferenceFrame, RunConfiguration};
use crate::consts::{LIGHT_SIGMA, OUTPUT_EXTENSION, REGISTERED_PREFIX, TIMESTAMP_FORMAT};
use crate::engine::{Engine, EngineCommand, Normalization, StackParams};
use crate::error::Result;

use super::helpers::{collect_stats, prefixed, run};
use super::types::PipelineStage;

/// Register `calibrated` against the configured reference frame.
///
/// Returns the name of the registered sequence.
pub(super) fn register_lights<E: Engine + ?Sized>(
    engine: &mut E,
    config: &RunConfiguration,
    calibrated: &str,
) -> Result<String> {
    let stage = PipelineStage::Register;
    info!(reference = %config.reference, "Registering {calibrated}");

    match config.reference {
        ReferenceFrame::First => {
            run(engine, stage, register_command(calibrated, false))?;
        }
        ReferenceFrame::Index(index) => {
            run(
                engine,
                stage,
                EngineCommand::SetRef {
                    sequence: calibrated.to_string(),
                    index,
                },
            )?;
            run(engine, stage, register_command(calibrated, false))?;
        }
        ReferenceFrame::TwoPass => {
            // The first pass only measures; the second writes the frames.
            run(engine, stage, register_command(calibrated, true))?;
            run(
                engine,
                stage,
                EngineCommand::ApplyRegistration {
                    sequence: calibrated.to_string(),
                    prefix: REGISTERED_PREFIX.to_string(),
                },
            )?;
        }
    }

    let registered = prefixed(REGISTERED_PREFIX, calibrated);
    collect_stats(engine, stage, &registered)?;
    Ok(registered)
}

fn register_command(sequence: &str, two_pass: bool) -> EngineCommand {
    EngineCommand::Register {
        sequence: sequence.to_string(),
        prefix: (!two_pass).then(|| REGISTERED_PREFIX.to_string()),
        two_pass,
    }
}

/// File name of a stacked result produced at `when`.
pub fn stacked_filename(when: DateTime<Local>) -> String {
    format!(
        "stacked_{}.{OUTPUT_EXTENSION}",
        when.format(TIMESTAMP_FORMAT)
    )
}

/// Sigma-reject stack `registered`, dropping frames outside the configured
/// quality filters. Returns the path of the stacked image.
pub(super) fn stack_lights<E: Engine + ?Sized>(
    engine: &mut E,
    config: &RunConfiguration,
    registered: &str,
    when: DateTime<Local>,
) -> Result<PathBuf> {
    let stage = PipelineStage::Stack;
    let process_dir = config.process_dir();
    let output = stacked_filename(when);

    info!(
        fwhm = config.filters.fwhm,
        wfwhm = config.filters.wfwhm,
        roundness = config.filters.roundness,
        output = %output,
        "Stacking {registered}"
    );

    run(engine, stage, EngineCommand::Cd(process_dir.clone()))?;
    run(
        engine,
        stage,
        EngineCommand::Stack(StackParams {
            sequence: registered.to_string(),
            sigma_low: LIGHT_SIGMA.0,
            sigma_high: LIGHT_SIGMA.1,
            normalization: Normalization::AdditiveScale,
            filters: Some(config.filters),
            output: output.clone(),
        }),
    )?;

    Ok(process_dir.join(output))
}
