use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::info;

use super::{Engine, EngineCommand, EngineError};

/// Dry-run engine: writes every command to a Siril script file instead of
/// executing it. The script can later be run with `siril-cli -s <file>`.
pub struct ScriptWriter {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    commands_written: usize,
}

impl ScriptWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            out: None,
            commands_written: 0,
        }
    }

    pub fn commands_written(&self) -> usize {
        self.commands_written
    }
}

impl Engine for ScriptWriter {
    fn name(&self) -> &str {
        "script writer"
    }

    fn open(&mut self) -> Result<(), EngineError> {
        let file = File::create(&self.path).map_err(|e| {
            EngineError::Unavailable(format!("cannot create {}: {e}", self.path.display()))
        })?;
        self.out = Some(BufWriter::new(file));
        self.commands_written = 0;
        Ok(())
    }

    fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| EngineError::Failed("script writer is not open".into()))?;
        writeln!(out, "{command}").map_err(|e| EngineError::Failed(e.to_string()))?;
        self.commands_written += 1;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut out) = self.out.take() {
            if let Err(e) = out.flush() {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to flush script");
                return;
            }
            info!(
                path = %self.path.display(),
                commands = self.commands_written,
                "Script written"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSession;

    #[test]
    fn writes_one_line_per_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.ssf");
        {
            let mut session = EngineSession::open(ScriptWriter::new(&path)).unwrap();
            session.execute(&EngineCommand::Set32Bits).unwrap();
            session.execute(&EngineCommand::SetCpu(4)).unwrap();
            assert_eq!(session.commands_written(), 2);
        }
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "set32bits\nsetcpu 4\n");
    }

    #[test]
    fn execute_before_open_fails() {
        let mut writer = ScriptWriter::new("unused.ssf");
        assert!(writer.execute(&EngineCommand::Set32Bits).is_err());
    }
}
