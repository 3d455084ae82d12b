use std::path::Path;

use tracing::{info, warn};

use crate::config::RunConfiguration;
use crate::consts::{CALIBRATED_PREFIX, MASTER_FLAT_FILE};
use crate::engine::{CalibrateParams, Engine, EngineCommand};
use crate::error::Result;
use crate::frames::FrameClass;

use super::helpers::{collect_stats, prefixed, run};
use super::types::PipelineStage;

const STAGE: PipelineStage = PipelineStage::LightPreprocess;

/// Convert the light frames in `source` and calibrate them against the
/// masters: flat always, bias and dark optimization only when the camera
/// calls for them. Color mosaics are debayered and equalized.
///
/// Returns the name of the calibrated sequence.
pub(super) fn preprocess_lights<E: Engine + ?Sized>(
    engine: &mut E,
    config: &RunConfiguration,
    source: &Path,
    bias: Option<&Path>,
    dark: Option<&Path>,
) -> Result<String> {
    let caps = config.capabilities();
    let process_dir = config.process_dir();
    let converted = FrameClass::Light.sequence_name();

    run(engine, STAGE, EngineCommand::Cd(source.to_path_buf()))?;
    run(
        engine,
        STAGE,
        EngineCommand::Convert {
            sequence: converted.to_string(),
            ingestion: caps.ingestion,
            out: process_dir.clone(),
            start: config.sequence_start,
        },
    )?;
    run(engine, STAGE, EngineCommand::Cd(process_dir))?;
    collect_stats(engine, STAGE, converted)?;

    if dark.is_none() {
        warn!("No dark master available, lights are calibrated without dark subtraction");
    }

    let params = CalibrateParams {
        sequence: converted.to_string(),
        bias: if caps.bias_in_lights {
            bias.map(Path::to_path_buf)
        } else {
            None
        },
        dark: dark.map(Path::to_path_buf),
        flat: Some(MASTER_FLAT_FILE.into()),
        cfa: true,
        debayer: true,
        equalize_cfa: true,
        optimize_dark: caps.dark_optimization && dark.is_some(),
        prefix: Some(CALIBRATED_PREFIX.to_string()),
    };
    info!(
        bias = params.bias.is_some(),
        dark = params.dark.is_some(),
        optimize_dark = params.optimize_dark,
        "Calibrating lights"
    );
    run(engine, STAGE, EngineCommand::Calibrate(params))?;

    let calibrated = prefixed(CALIBRATED_PREFIX, converted);
    collect_stats(engine, STAGE, &calibrated)?;
    Ok(calibrated)
}
