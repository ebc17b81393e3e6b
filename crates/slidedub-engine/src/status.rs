//! Job status store: one durable record per pipeline stage.
//!
//! The engine only reads "is stage X complete" and writes stage
//! transitions; the persistence mechanism behind the trait is the caller's
//! choice. A JSON-file implementation is provided for single-machine jobs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use slidedub_models::StageStatus;

use crate::error::EngineResult;

/// Durable per-stage status records for one job.
pub trait StatusStore {
    /// Current status of a stage, if it has ever been touched.
    fn status(&self, stage: &str) -> Option<StageStatus>;

    /// Whether a stage has completed successfully.
    fn is_completed(&self, stage: &str) -> bool {
        self.status(stage).is_some_and(|s| s.is_completed())
    }

    /// Mark a stage as running.
    fn mark_running(&mut self, stage: &str) -> EngineResult<()>;

    /// Mark a stage as completed.
    fn mark_completed(&mut self, stage: &str) -> EngineResult<()>;

    /// Mark a stage as failed with error text.
    fn mark_failed(&mut self, stage: &str, error: &str) -> EngineResult<()>;
}

/// JSON-file status store, persisted on every transition.
#[derive(Debug)]
pub struct JsonStatusStore {
    path: PathBuf,
    stages: BTreeMap<String, StageStatus>,
}

impl JsonStatusStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let stages = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, stages })
    }

    fn persist(&self) -> EngineResult<()> {
        let content = serde_json::to_string_pretty(&self.stages)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn entry(&mut self, stage: &str) -> &mut StageStatus {
        self.stages.entry(stage.to_string()).or_default()
    }
}

impl StatusStore for JsonStatusStore {
    fn status(&self, stage: &str) -> Option<StageStatus> {
        self.stages.get(stage).cloned()
    }

    fn mark_running(&mut self, stage: &str) -> EngineResult<()> {
        self.entry(stage).start();
        self.persist()
    }

    fn mark_completed(&mut self, stage: &str) -> EngineResult<()> {
        self.entry(stage).complete();
        self.persist()
    }

    fn mark_failed(&mut self, stage: &str, error: &str) -> EngineResult<()> {
        self.entry(stage).fail(error);
        self.persist()
    }
}
