mod command;
pub mod script;
pub mod siril;

use std::ops::{Deref, DerefMut};

use thiserror::Error;
use tracing::{debug, warn};

pub use command::{CalibrateParams, EngineCommand, Normalization, StackParams};

/// Failure reported by an engine for a single command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine does not know this command (e.g. an older release).
    #[error("command not supported: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Failed(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// An external image-processing engine driven one command at a time.
///
/// Every call blocks until the engine has finished the command.
pub trait Engine {
    fn name(&self) -> &str;

    /// Start the engine session.
    fn open(&mut self) -> Result<(), EngineError>;

    /// Run one command to completion.
    fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError>;

    /// End the session. Called exactly once per successful `open`.
    fn close(&mut self);
}

impl<E: Engine + ?Sized> Engine for &mut E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<(), EngineError> {
        (**self).open()
    }

    fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        (**self).execute(command)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<(), EngineError> {
        (**self).open()
    }

    fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        (**self).execute(command)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// An open engine session. The engine is closed when the session is dropped,
/// whichever way the run ends.
pub struct EngineSession<E: Engine> {
    engine: E,
}

impl<E: Engine> EngineSession<E> {
    pub fn open(mut engine: E) -> Result<Self, EngineError> {
        engine.open()?;
        debug!(engine = engine.name(), "Engine session opened");
        Ok(Self { engine })
    }
}

impl<E: Engine> Deref for EngineSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: Engine> DerefMut for EngineSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: Engine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!(engine = self.engine.name(), "Closing engine session during panic");
        }
        self.engine.close();
        debug!(engine = self.engine.name(), "Engine session closed");
    }
}
