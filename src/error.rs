use std::{fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Stage;

/// Errors that end a pipeline run.
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value (or the configuration file itself) was not supplied.
    /// Raised before any stage runs.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// A configuration value was supplied but cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The input asset does not exist or is not a file, but a stage needed to read it.
    #[error("Input asset unavailable: {0}")]
    InputAssetUnavailable(PathBuf),

    /// A stage returned an error.
    #[error("Stage {stage} failed: {reason}")]
    StageExecutionFailed { stage: Stage, reason: String },

    /// A stage ran to completion but its completion marker is missing or unreadable.
    #[error("Stage {stage} finished but its output at {path} is missing or corrupt")]
    CacheMarkerInconsistent { stage: Stage, path: PathBuf },
}

impl Error {
    pub(crate) fn stage_failed(stage: Stage, reason: impl Display) -> Self {
        Self::StageExecutionFailed {
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Per-frame failures. These never end a run: the frame is left out of the kept set and
/// is listed separately in the report.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameError {
    /// Pixel data for the frame could not be decoded.
    #[error("Unreadable frame {path}: {reason}")]
    UnreadableFrame { path: PathBuf, reason: String },
}

impl FrameError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self::UnreadableFrame {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Filesystem failures while reading frames or writing the dedup stage output.
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Error accessing {path}: {src}")]
    Io { src: std::io::Error, path: PathBuf },

    #[error("Failed to serialize report to {path}: {src}")]
    Serialization { src: String, path: PathBuf },

    #[error("Failed to deserialize report from {path}: {src}")]
    Deserialization { src: String, path: PathBuf },
}

impl DedupError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |src| Self::Io { src, path }
    }
}
