use tracing::{debug, warn};

use crate::engine::{Engine, EngineCommand, EngineError};
use crate::error::{Result, StarprepError};

use super::types::PipelineStage;

/// Run one engine command on behalf of `stage`.
pub(super) fn run<E: Engine + ?Sized>(
    engine: &mut E,
    stage: PipelineStage,
    command: EngineCommand,
) -> Result<()> {
    debug!(stage = %stage, command = %command, "Engine command");
    engine
        .execute(&command)
        .map_err(|e| StarprepError::engine(stage, format!("{}: {e}", command.verb())))
}

/// Persist summary statistics of `sequence` to `<sequence>.csv`.
///
/// Statistics are informational: an engine that does not support them is
/// logged and skipped.
pub(super) fn collect_stats<E: Engine + ?Sized>(
    engine: &mut E,
    stage: PipelineStage,
    sequence: &str,
) -> Result<()> {
    let command = EngineCommand::SeqStat {
        sequence: sequence.to_string(),
        output: format!("{sequence}.csv"),
    };
    match engine.execute(&command) {
        Ok(()) => Ok(()),
        Err(EngineError::Unsupported(msg)) => {
            warn!(stage = %stage, sequence, reason = %msg, "Sequence statistics skipped");
            Ok(())
        }
        Err(e) => Err(StarprepError::engine(stage, format!("seqstat: {e}"))),
    }
}

/// Name the engine gives `sequence` after applying `prefix`.
pub(super) fn prefixed(prefix: &str, sequence: &str) -> String {
    format!("{prefix}{sequence}")
}
