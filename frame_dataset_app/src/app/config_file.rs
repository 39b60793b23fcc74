use std::path::{Path, PathBuf};

use frame_dataset_lib::{Error, ExtractionParams, FingerprintAlgorithm, PipelineConfig, DEFAULT_DEDUP_THRESHOLD};
use serde::Deserialize;

use crate::app::*;

/// Contents of the JSON config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub input_path: Option<PathBuf>,
    pub fps: Option<f64>,
    pub max_frames: Option<u32>,
    pub scale_width: Option<u32>,
    pub dedup_threshold: Option<u32>,
    pub fingerprint: Option<FingerprintAlgorithm>,
    pub work_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Read a config file. Relative paths inside it are taken relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|src| AppError::ConfigRead {
            src,
            path: path.to_path_buf(),
        })?;

        let mut ret: Self = serde_json::from_str(&text).map_err(|src| AppError::ConfigParse {
            src,
            path: path.to_path_buf(),
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let rebase = |p: &mut Option<PathBuf>| {
            if let Some(p) = p.as_mut() {
                if p.is_relative() {
                    *p = base_dir.join(&*p);
                }
            }
        };
        rebase(&mut ret.input_path);
        rebase(&mut ret.work_dir);
        rebase(&mut ret.output_dir);

        Ok(ret)
    }
}

/// Everything needed to start a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCfg {
    pub pipeline: PipelineConfig,
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
}

fn default_work_dir(cwd: &Path) -> PathBuf {
    match directories_next::ProjectDirs::from("", "frame_dataset", "frame_dataset") {
        Some(dirs) => dirs.cache_dir().to_path_buf(),
        None => cwd.join(".cache"),
    }
}

/// Combine the config file with command line overrides. Command line values win.
pub fn resolve_cfg(cfg: &AppCfg, cwd: &Path) -> Result<ResolvedCfg, AppError> {
    let file = match &cfg.config_path {
        ConfigPath::Explicit(path) if !path.exists() => {
            return Err(Error::ConfigurationMissing(format!("config file {} does not exist", path.display())).into());
        }
        ConfigPath::Explicit(path) => ConfigFile::load(path)?,
        ConfigPath::Default(path) if path.is_file() => ConfigFile::load(path)?,
        ConfigPath::Default(path) => {
            debug!("No config file at {}, using command line arguments only", path.display());
            ConfigFile::default()
        }
    };

    let o = &cfg.overrides;

    let input_path = o
        .input_path
        .clone()
        .or(file.input_path)
        .ok_or_else(|| Error::ConfigurationMissing("no input path given in the config file or with --input".to_string()))?;

    let defaults = ExtractionParams::default();
    let pipeline = PipelineConfig {
        input_path,
        extraction: ExtractionParams {
            fps: o.fps.or(file.fps).unwrap_or(defaults.fps),
            max_frames: o.max_frames.or(file.max_frames).unwrap_or(defaults.max_frames),
            scale_width: o.scale_width.or(file.scale_width).unwrap_or(defaults.scale_width),
        },
        dedup_threshold: o
            .dedup_threshold
            .or(file.dedup_threshold)
            .unwrap_or(DEFAULT_DEDUP_THRESHOLD),
        fingerprint: o.fingerprint.or(file.fingerprint).unwrap_or_default(),
    };

    Ok(ResolvedCfg {
        pipeline,
        work_dir: o
            .work_dir
            .clone()
            .or(file.work_dir)
            .unwrap_or_else(|| default_work_dir(cwd)),
        output_dir: o
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| cwd.join("outputs")),
    })
}
