use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::RunConfiguration;
use crate::consts::{
    CALIBRATED_PREFIX, DARK_SIGMA, FLAT_SIGMA, MASTER_DARK_FILE, MASTER_FLAT_FILE,
    MASTER_OFFSET_FILE, OFFSET_SIGMA,
};
use crate::engine::{CalibrateParams, Engine, EngineCommand, Normalization, StackParams};
use crate::error::Result;
use crate::frames::FrameClass;

use super::helpers::{collect_stats, prefixed, run};
use super::types::PipelineStage;

/// Recipe for one master calibration frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MasterFrame {
    pub class: FrameClass,
    /// Bias (or dark-flat) master subtracted before stacking.
    pub bias: Option<PathBuf>,
    pub sigma_low: f32,
    pub sigma_high: f32,
    pub normalization: Normalization,
    /// File name of the master inside the process directory.
    pub output: &'static str,
}

impl MasterFrame {
    /// Offset master for DSLRs, or the dark-flat master for cooled cameras.
    pub fn offset() -> Self {
        Self {
            class: FrameClass::Offset,
            bias: None,
            sigma_low: OFFSET_SIGMA.0,
            sigma_high: OFFSET_SIGMA.1,
            normalization: Normalization::None,
            output: MASTER_OFFSET_FILE,
        }
    }

    pub fn flat(bias: Option<PathBuf>) -> Self {
        Self {
            class: FrameClass::Flat,
            bias,
            sigma_low: FLAT_SIGMA.0,
            sigma_high: FLAT_SIGMA.1,
            normalization: Normalization::Multiplicative,
            output: MASTER_FLAT_FILE,
        }
    }

    pub fn dark(bias: Option<PathBuf>) -> Self {
        Self {
            class: FrameClass::Dark,
            bias,
            sigma_low: DARK_SIGMA.0,
            sigma_high: DARK_SIGMA.1,
            normalization: Normalization::None,
            output: MASTER_DARK_FILE,
        }
    }

    /// Name of the sequence that gets stacked.
    pub fn stacked_sequence(&self) -> String {
        let converted = self.class.sequence_name();
        if self.bias.is_some() {
            prefixed(CALIBRATED_PREFIX, converted)
        } else {
            converted.to_string()
        }
    }
}

/// Convert the raw frames in `source`, subtract the master's bias if it has
/// one, record statistics and stack them into the master file.
///
/// Returns the master's path relative to the process directory.
pub(super) fn build_master<E: Engine + ?Sized>(
    engine: &mut E,
    stage: PipelineStage,
    master: &MasterFrame,
    source: &Path,
    config: &RunConfiguration,
) -> Result<PathBuf> {
    let process_dir = config.process_dir();
    let converted = master.class.sequence_name();

    run(engine, stage, EngineCommand::Cd(source.to_path_buf()))?;
    run(
        engine,
        stage,
        EngineCommand::Convert {
            sequence: converted.to_string(),
            ingestion: config.capabilities().ingestion,
            out: process_dir.clone(),
            start: config.sequence_start,
        },
    )?;
    run(engine, stage, EngineCommand::Cd(process_dir))?;

    if let Some(ref bias) = master.bias {
        run(
            engine,
            stage,
            EngineCommand::Calibrate(CalibrateParams {
                sequence: converted.to_string(),
                bias: Some(bias.clone()),
                ..Default::default()
            }),
        )?;
    }

    let sequence = master.stacked_sequence();
    collect_stats(engine, stage, &sequence)?;

    run(
        engine,
        stage,
        EngineCommand::Stack(StackParams {
            sequence,
            sigma_low: master.sigma_low,
            sigma_high: master.sigma_high,
            normalization: master.normalization,
            filters: None,
            output: master.output.to_string(),
        }),
    )?;

    info!(class = %master.class, output = master.output, "Master built");
    Ok(PathBuf::from(master.output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibrated_masters_stack_the_prefixed_sequence() {
        assert_eq!(MasterFrame::offset().stacked_sequence(), "offset");
        let flat = MasterFrame::flat(Some(PathBuf::from(MASTER_OFFSET_FILE)));
        assert_eq!(flat.stacked_sequence(), "pp_flat");
        assert_eq!(MasterFrame::dark(None).stacked_sequence(), "dark");
    }

    #[test]
    fn class_thresholds_are_fixed() {
        let flat = MasterFrame::flat(None);
        assert_eq!((flat.sigma_low, flat.sigma_high), (3.0, 3.0));
        assert_eq!(flat.normalization, Normalization::Multiplicative);
        let dark = MasterFrame::dark(None);
        assert_eq!((dark.sigma_low, dark.sigma_high), (3.5, 3.5));
        assert_eq!(dark.normalization, Normalization::None);
        assert_eq!(MasterFrame::offset().normalization, Normalization::None);
    }
}
