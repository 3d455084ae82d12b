use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarprepError {
    #[error("Invalid option {flag}: {reason}")]
    Configuration { flag: String, reason: String },

    #[error("Stage '{stage}' failed: {message}")]
    EngineOperation { stage: String, message: String },

    #[error("Directory not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    ConfigParse(String),
}

impl StarprepError {
    pub(crate) fn config(flag: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            flag: flag.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn engine(stage: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::EngineOperation {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Name of the stage that failed, if this is an engine failure.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::EngineOperation { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StarprepError>;
