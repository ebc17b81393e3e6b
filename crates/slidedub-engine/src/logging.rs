//! Structured stage logging.

use tracing::{info, warn};

/// Consistent lifecycle logging for pipeline stages.
#[derive(Debug, Clone)]
pub struct StageLogger {
    job_id: String,
    stage: String,
}

impl StageLogger {
    pub fn new(job_id: &str, stage: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: stage.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = %self.stage,
            "{}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            stage = %self.stage,
            "{}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }
}
