pub mod fs_stage_store;

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Dedup,
    Package,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Extract, Stage::Dedup, Stage::Package];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Dedup => "dedup",
            Stage::Package => "package",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of a stage within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Skipped,
    Running,
    Done,
    Failed,
}

/// Records the transitions of a single stage.
///
/// Allowed paths are `Pending -> Skipped -> Done` and `Pending -> Running -> Done|Failed`.
/// Any other transition is a bug in the caller and is rejected without changing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    stage: Stage,
    history: Vec<StageState>,
}

impl StageProgress {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            history: vec![StageState::Pending],
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn state(&self) -> StageState {
        //history always starts with Pending.
        self.history.last().copied().unwrap_or(StageState::Pending)
    }

    /// Every state the stage has been in, oldest first.
    pub fn history(&self) -> &[StageState] {
        &self.history
    }

    pub fn skip(&mut self) -> bool {
        self.transition(StageState::Pending, StageState::Skipped)
    }

    pub fn start(&mut self) -> bool {
        self.transition(StageState::Pending, StageState::Running)
    }

    pub fn finish(&mut self) -> bool {
        match self.state() {
            StageState::Skipped | StageState::Running => {
                self.history.push(StageState::Done);
                trace!(target: "stage_cache", "{}: done", self.stage);
                true
            }
            _ => false,
        }
    }

    pub fn fail(&mut self) -> bool {
        self.transition(StageState::Running, StageState::Failed)
    }

    fn transition(&mut self, from: StageState, to: StageState) -> bool {
        if self.state() == from {
            trace!(target: "stage_cache", "{}: {from:?} -> {to:?}", self.stage);
            self.history.push(to);
            true
        } else {
            false
        }
    }
}

/// Remembers which stages of a run have completed.
///
/// A store is scoped to a single run identity. Completion is judged from the presence of
/// each stage's output, so a store must never report a stage as complete while that
/// stage's output is missing.
pub trait StageStore {
    /// True if the stage's output is present and usable.
    fn exists(&self, stage: Stage) -> bool;

    /// Called after a stage has run. Fails with [`Error::CacheMarkerInconsistent`] if the
    /// stage's output cannot be found, in which case the stage is not considered complete.
    fn mark_complete(&self, stage: Stage) -> Result<(), Error>;

    /// Where the stage writes its output.
    fn path_for(&self, stage: Stage) -> PathBuf;
}

impl<S: StageStore + ?Sized> StageStore for &S {
    fn exists(&self, stage: Stage) -> bool {
        (**self).exists(stage)
    }

    fn mark_complete(&self, stage: Stage) -> Result<(), Error> {
        (**self).mark_complete(stage)
    }

    fn path_for(&self, stage: Stage) -> PathBuf {
        (**self).path_for(stage)
    }
}
