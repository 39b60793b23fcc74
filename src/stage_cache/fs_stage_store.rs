use std::path::{Path, PathBuf};

use crate::{definitions::*, *};

/// A [`StageStore`] that judges completion from files on disk.
///
/// | Stage   | Output                               | Complete when                              |
/// |---------|--------------------------------------|--------------------------------------------|
/// | extract | `<work_dir>/frames_raw/<run_id>/`    | the directory holds at least one frame     |
/// | dedup   | `<work_dir>/frames_clean/<run_id>/`  | `dedup_report.json` loads and is consistent |
/// | package | `<output_dir>/dataset_<run_id>.zip`  | the archive exists and is non-empty        |
#[derive(Debug, Clone)]
pub struct FsStageStore {
    run_id: RunIdentity,
    work_dir: PathBuf,
    output_dir: PathBuf,
}

impl FsStageStore {
    pub fn new(run_id: RunIdentity, work_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            run_id,
            work_dir: work_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn run_id(&self) -> &RunIdentity {
        &self.run_id
    }

    fn marker_present(&self, stage: Stage) -> bool {
        let path = self.path_for(stage);
        match stage {
            Stage::Extract => match list_frames(&path) {
                Ok(frames) => !frames.is_empty(),
                Err(_) => false,
            },
            Stage::Dedup => {
                let report_path = path.join(DEDUP_REPORT_FILENAME);
                if !report_path.is_file() {
                    return false;
                }
                match DedupReport::load(&report_path) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(target: "stage_cache", "Ignoring unusable dedup report: {e}");
                        false
                    }
                }
            }
            Stage::Package => match std::fs::metadata(&path) {
                Ok(meta) => meta.is_file() && meta.len() > 0,
                Err(_) => false,
            },
        }
    }
}

impl StageStore for FsStageStore {
    fn exists(&self, stage: Stage) -> bool {
        let present = self.marker_present(stage);
        debug!(
            target: "stage_cache",
            "{stage} for run {}: {}",
            self.run_id,
            if present { "cached" } else { "not cached" }
        );
        present
    }

    fn mark_complete(&self, stage: Stage) -> Result<(), Error> {
        if self.marker_present(stage) {
            info!(target: "stage_cache", "{stage} complete for run {}", self.run_id);
            Ok(())
        } else {
            Err(Error::CacheMarkerInconsistent {
                stage,
                path: self.path_for(stage),
            })
        }
    }

    fn path_for(&self, stage: Stage) -> PathBuf {
        match stage {
            Stage::Extract => self.work_dir.join(RAW_FRAMES_DIRNAME).join(self.run_id.as_str()),
            Stage::Dedup => self.work_dir.join(CLEAN_FRAMES_DIRNAME).join(self.run_id.as_str()),
            Stage::Package => self.output_dir.join(format!("dataset_{}.zip", self.run_id)),
        }
    }
}
