//! Pipeline stage status records.
//!
//! One `StageStatus` per pipeline stage is kept in the job status store,
//! enabling resumable jobs and per-stage pass/fail reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing state of a single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Stage has not started yet.
    #[default]
    Pending,
    /// Stage is actively running.
    Running,
    /// Stage completed successfully.
    Completed,
    /// Stage failed with an error.
    Failed,
}

impl StageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Pending => "pending",
            StageState::Running => "running",
            StageState::Completed => "completed",
            StageState::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageState::Completed | StageState::Failed)
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable record for one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StageStatus {
    /// Current stage state.
    pub state: StageState,
    /// When the stage started running.
    pub started_at: Option<DateTime<Utc>>,
    /// When the stage reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Error text if the stage failed.
    pub error: Option<String>,
}

impl StageStatus {
    /// Mark the stage as running and stamp the start time.
    pub fn start(&mut self) {
        self.state = StageState::Running;
        self.started_at = Some(Utc::now());
        self.error = None;
    }

    /// Mark the stage as completed.
    pub fn complete(&mut self) {
        self.state = StageState::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the stage as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = StageState::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    pub fn is_completed(&self) -> bool {
        self.state == StageState::Completed
    }
}
