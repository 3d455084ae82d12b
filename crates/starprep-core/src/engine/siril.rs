//! Siril driven through its command-line interpreter.
//!
//! Each command runs as a short script fed to `siril-cli -s -` on stdin. The
//! session preferences and the current directory are replayed at the top of
//! every script, so the engine sees the same state a long-lived session would.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, info};

use crate::consts::{DEFAULT_SIRIL_EXECUTABLE, SIRIL_REQUIRED_VERSION};

use super::{Engine, EngineCommand, EngineError};

pub struct SirilCli {
    executable: PathBuf,
    preferences: Vec<EngineCommand>,
    cwd: Option<PathBuf>,
}

impl Default for SirilCli {
    fn default() -> Self {
        Self::new()
    }
}

impl SirilCli {
    pub fn new() -> Self {
        Self::with_executable(DEFAULT_SIRIL_EXECUTABLE)
    }

    /// Use a specific `siril-cli` binary.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            preferences: vec![EngineCommand::Requires(SIRIL_REQUIRED_VERSION.to_string())],
            cwd: None,
        }
    }

    /// Full script run for `command`, given the current session state.
    pub fn script_for(&self, command: &EngineCommand) -> String {
        let mut lines: Vec<String> = self.preferences.iter().map(ToString::to_string).collect();
        if let Some(ref cwd) = self.cwd {
            if !matches!(command, EngineCommand::Cd(_)) {
                lines.push(EngineCommand::Cd(cwd.clone()).to_string());
            }
        }
        lines.push(command.to_string());
        lines.join("\n") + "\n"
    }

    fn remember_preference(&mut self, command: &EngineCommand) {
        let verb = command.verb();
        self.preferences.retain(|p| p.verb() != verb);
        self.preferences.push(command.clone());
    }

    fn run_script(&self, script: &str) -> Result<Output, EngineError> {
        let mut child = Command::new(&self.executable)
            .arg("-s")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::Unavailable(format!("{}: {e}", self.executable.display()))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(script.as_bytes())
                .map_err(|e| EngineError::Failed(format!("failed to send script: {e}")))?;
        }

        child
            .wait_with_output()
            .map_err(|e| EngineError::Failed(format!("failed to wait for engine: {e}")))
    }
}

/// Map the engine's output to a command result.
pub fn interpret_output(success: bool, stdout: &str, stderr: &str) -> Result<(), EngineError> {
    let lines = || stdout.lines().chain(stderr.lines()).map(str::trim);

    if let Some(line) = lines().find(|l| l.contains("Unknown command")) {
        return Err(EngineError::Unsupported(line.to_string()));
    }
    if success {
        return Ok(());
    }
    let message = lines()
        .filter(|l| l.to_ascii_lowercase().contains("error"))
        .last()
        .or_else(|| lines().filter(|l| !l.is_empty()).last())
        .unwrap_or("engine exited with an error and no output");
    Err(EngineError::Failed(message.to_string()))
}

impl Engine for SirilCli {
    fn name(&self) -> &str {
        "siril-cli"
    }

    fn open(&mut self) -> Result<(), EngineError> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .output()
            .map_err(|e| {
                EngineError::Unavailable(format!("{}: {e}", self.executable.display()))
            })?;
        if !output.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --version exited with {}",
                self.executable.display(),
                output.status
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(executable = %self.executable.display(), version = %version, "Siril found");
        Ok(())
    }

    fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        if command.is_preference() {
            self.remember_preference(command);
            return Ok(());
        }

        let script = self.script_for(command);
        debug!(command = %command, "Running Siril script");
        let output = self.run_script(&script)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines() {
            debug!(target: "siril", "{line}");
        }
        interpret_output(output.status.success(), &stdout, &stderr)?;

        if let EngineCommand::Cd(dir) = command {
            self.cwd = Some(dir.clone());
        }
        Ok(())
    }

    fn close(&mut self) {
        self.cwd = None;
    }
}

/// Resolve a `siril-cli` path: an explicit one, else the default name on `PATH`.
pub fn executable_or_default(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SIRIL_EXECUTABLE))
}
