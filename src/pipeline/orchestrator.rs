use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{definitions::*, *};

/// How a stage was satisfied in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    /// The stage's output was already present.
    Skipped,
    /// The stage ran.
    Executed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub history: Vec<StageState>,
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunIdentity,
    pub input_path: PathBuf,
    pub stages: Vec<StageRecord>,
    pub report: DedupReport,
    pub archive: PathBuf,
}

impl RunSummary {
    /// Outcome of the given stage.
    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| r.outcome)
    }

    /// Contents of `summary_<run_id>.txt`.
    pub fn to_text(&self) -> String {
        format!("run_id={}\nvideo={}\n", self.run_id, self.input_path.display())
    }

    fn save(&self, path: &Path) -> Result<(), Error> {
        std::fs::write(path, self.to_text())
            .map_err(|e| Error::stage_failed(Stage::Package, format!("writing {}: {e}", path.display())))
    }
}

/// Runs extract, dedup and package in order, skipping any stage whose output is already
/// present in the [`StageStore`].
///
/// A stage that fails ends the run. Later stages do not run, so no archive is produced
/// from a partial dedup.
///
/// Frames are fingerprinted with the [`ConfiguredHasher`] for `cfg.fingerprint`, the same
/// field that goes into the run identity.
pub struct Orchestrator<'a> {
    extractor: &'a dyn FrameExtractor,
    decoder: &'a dyn PixelDecoder,
    packager: &'a dyn Packager,
}

impl<'a> Orchestrator<'a> {
    pub fn new(extractor: &'a dyn FrameExtractor, decoder: &'a dyn PixelDecoder, packager: &'a dyn Packager) -> Self {
        Self {
            extractor,
            decoder,
            packager,
        }
    }

    /// Run the pipeline for `cfg`.
    ///
    /// The run identity is resolved first, and `open_store` is called with it to obtain
    /// the stage store for this run.
    pub fn run<S, F>(&self, cfg: &PipelineConfig, open_store: F) -> Result<RunSummary, Error>
    where
        S: StageStore,
        F: FnOnce(&RunIdentity) -> S,
    {
        cfg.validate()?;

        let run_id = RunIdentity::resolve(cfg);
        info!(target: "stage_cache", "Run identity: {run_id}");
        let store = open_store(&run_id);

        let raw_dir = store.path_for(Stage::Extract);
        let clean_dir = store.path_for(Stage::Dedup);
        let archive_path = store.path_for(Stage::Package);

        let mut stages = vec![];

        stages.push(self.run_stage(Stage::Extract, &store, || self.extract(cfg, &raw_dir))?);
        stages.push(self.run_stage(Stage::Dedup, &store, || self.dedup(cfg, &raw_dir, &clean_dir))?);

        let root_name = format!("{CLEAN_FRAMES_DIRNAME}_{run_id}");
        stages.push(self.run_stage(Stage::Package, &store, || {
            self.packager
                .package(&clean_dir, &root_name, &archive_path)
                .map_err(|e| Error::stage_failed(Stage::Package, e))
        })?);

        let report_path = clean_dir.join(DEDUP_REPORT_FILENAME);
        let report = DedupReport::load(&report_path).map_err(|_| Error::CacheMarkerInconsistent {
            stage: Stage::Dedup,
            path: report_path.clone(),
        })?;

        let summary = RunSummary {
            run_id,
            input_path: cfg.input_path.clone(),
            stages,
            report,
            archive: archive_path,
        };

        if let Some(out_dir) = summary.archive.parent() {
            summary.save(&out_dir.join(format!("summary_{}.txt", summary.run_id)))?;
        }

        Ok(summary)
    }

    fn run_stage<S, F>(&self, stage: Stage, store: &S, exec: F) -> Result<StageRecord, Error>
    where
        S: StageStore,
        F: FnOnce() -> Result<(), Error>,
    {
        let mut progress = StageProgress::new(stage);

        if store.exists(stage) {
            info!(target: "stage_cache", "Skipping {stage}: output already present");
            progress.skip();
            progress.finish();
            return Ok(StageRecord {
                stage,
                outcome: StageOutcome::Skipped,
                history: progress.history().to_vec(),
            });
        }

        info!(target: "stage_cache", "Running {stage}");
        progress.start();

        match exec().and_then(|()| store.mark_complete(stage)) {
            Ok(()) => {
                progress.finish();
                Ok(StageRecord {
                    stage,
                    outcome: StageOutcome::Executed,
                    history: progress.history().to_vec(),
                })
            }
            Err(e) => {
                progress.fail();
                error!(target: "stage_cache", "{stage} failed: {e}");
                Err(e)
            }
        }
    }

    // Frames go into a sibling staging directory that is renamed to `raw_dir` only after
    // the extractor returns successfully. A failed extraction leaves `raw_dir` untouched.
    fn extract(&self, cfg: &PipelineConfig, raw_dir: &Path) -> Result<(), Error> {
        if !cfg.input_path.is_file() {
            return Err(Error::InputAssetUnavailable(cfg.input_path.clone()));
        }

        let staging_dir = staging_dir_for(raw_dir);
        let io_err =
            |path: &Path, e: std::io::Error| Error::stage_failed(Stage::Extract, format!("{}: {e}", path.display()));

        remove_dir_if_present(&staging_dir).map_err(|e| io_err(&staging_dir, e))?;
        std::fs::create_dir_all(&staging_dir).map_err(|e| io_err(&staging_dir, e))?;

        let num_frames = match self.extractor.extract(&cfg.input_path, &cfg.extraction, &staging_dir) {
            Ok(frames) => frames.count(),
            Err(e) => {
                if let Err(cleanup_err) = remove_dir_if_present(&staging_dir) {
                    warn!(target: "extract", "Could not remove {}: {cleanup_err}", staging_dir.display());
                }
                return Err(Error::stage_failed(Stage::Extract, e));
            }
        };

        remove_dir_if_present(raw_dir).map_err(|e| io_err(raw_dir, e))?;
        std::fs::rename(&staging_dir, raw_dir).map_err(|e| io_err(raw_dir, e))?;

        info!(target: "extract", "Extracted {num_frames} frames into {}", raw_dir.display());
        Ok(())
    }

    fn dedup(&self, cfg: &PipelineConfig, raw_dir: &Path, clean_dir: &Path) -> Result<(), Error> {
        let detector = NearDuplicateDetector::new(ConfiguredHasher::from(cfg.fingerprint), cfg.dedup_threshold);
        deduplicate_dir(raw_dir, clean_dir, &detector, self.decoder)
            .map(|_report| ())
            .map_err(|e| Error::stage_failed(Stage::Dedup, e))
    }
}

fn staging_dir_for(dir: &Path) -> PathBuf {
    let mut name = dir.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    dir.with_file_name(name)
}

fn remove_dir_if_present(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
