use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{definitions::*, Error};

/// How frames are sampled from the input asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionParams {
    /// Frames sampled per second of video. Ignored when importing from an archive.
    pub fps: f64,

    /// Keep at most this many frames. 0 means no limit.
    pub max_frames: u32,

    /// Resize frames to this width, preserving aspect ratio. 0 means no resizing.
    pub scale_width: u32,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            max_frames: 0,
            scale_width: 0,
        }
    }
}

/// Which fingerprint algorithm the dedup stage uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// DCT based perceptual hash.
    #[default]
    Phash,
    /// Average hash.
    Ahash,
}

impl FingerprintAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Phash => "phash",
            Self::Ahash => "ahash",
        }
    }
}

/// Everything that determines the output of a run. Each field takes part in the
/// [`RunIdentity`](crate::RunIdentity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub extraction: ExtractionParams,
    pub dedup_threshold: u32,
    pub fingerprint: FingerprintAlgorithm,
}

impl PipelineConfig {
    /// A configuration with default values for everything except the input.
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            extraction: ExtractionParams::default(),
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            fingerprint: FingerprintAlgorithm::default(),
        }
    }

    /// Reject configurations that cannot be run. This is checked before any stage runs.
    pub fn validate(&self) -> Result<(), Error> {
        if self.input_path.as_os_str().is_empty() {
            return Err(Error::ConfigurationMissing("input path".to_string()));
        }

        let fps = self.extraction.fps;
        if !fps.is_finite() || fps <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "fps must be a positive number, got {fps}"
            )));
        }

        Ok(())
    }
}
