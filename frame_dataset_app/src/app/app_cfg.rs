use std::path::PathBuf;

use frame_dataset_lib::FingerprintAlgorithm;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(super) enum FingerprintArg {
    Phash,
    Ahash,
}

impl From<FingerprintArg> for FingerprintAlgorithm {
    fn from(arg: FingerprintArg) -> Self {
        match arg {
            FingerprintArg::Phash => FingerprintAlgorithm::Phash,
            FingerprintArg::Ahash => FingerprintAlgorithm::Ahash,
        }
    }
}

// Where the config file comes from. A missing default config file is fine, a missing
// explicit one is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPath {
    Default(PathBuf),
    Explicit(PathBuf),
}

/// Values given on the command line. Each one replaces the matching config file value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub input_path: Option<PathBuf>,
    pub fps: Option<f64>,
    pub max_frames: Option<u32>,
    pub scale_width: Option<u32>,
    pub dedup_threshold: Option<u32>,
    pub fingerprint: Option<FingerprintAlgorithm>,
    pub work_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OutputCfg {
    pub format: OutputFormat,
    pub verbosity: ReportVerbosity,
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub config_path: ConfigPath,
    pub overrides: ConfigOverrides,
    pub output_cfg: OutputCfg,
    pub ffmpeg_timeout_secs: Option<u64>,
}
