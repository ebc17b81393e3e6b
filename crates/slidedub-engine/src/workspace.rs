//! Per-job working directory layout.
//!
//! Every intermediate artifact lives under one job-owned directory with a
//! deterministic name, so a restarted job finds and reuses everything its
//! previous run finished. Nothing here is shared between jobs.

use std::path::{Path, PathBuf};

use crate::error::EngineResult;

/// Deterministic artifact paths for one job.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    root: PathBuf,
}

impl JobWorkspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create the directory tree.
    pub async fn ensure(&self) -> EngineResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::create_dir_all(self.assembly_dir()).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extracted reference frames, named by sampling rate.
    pub fn frames_dir(&self, fps: u32) -> PathBuf {
        self.root.join(format!("frames_{}fps", fps))
    }

    /// Detected reference slide timeline.
    pub fn timing_path(&self) -> PathBuf {
        self.root.join("timing.json")
    }

    /// Derived target slide timeline.
    pub fn target_timing_path(&self) -> PathBuf {
        self.root.join("timing_target.json")
    }

    /// Per-stage status records.
    pub fn status_path(&self) -> PathBuf {
        self.root.join("status.json")
    }

    /// Working directory for reconciled audio, batches, and rendered clips.
    pub fn assembly_dir(&self) -> PathBuf {
        self.root.join("assembly")
    }

    /// Rendered clip for one target timeline segment.
    pub fn segment_clip_path(&self, index: usize) -> PathBuf {
        self.assembly_dir().join(format!("seg_{:04}.mp4", index))
    }

    /// The mixed narration track covering the full target duration.
    pub fn mixed_track_path(&self) -> PathBuf {
        self.assembly_dir().join("dub_track.wav")
    }

    /// The stitched (video-only content) output before muxing.
    pub fn stitched_path(&self) -> PathBuf {
        self.assembly_dir().join("slides_video.mp4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_are_deterministic() {
        let ws = JobWorkspace::new("/work/job-1");
        assert_eq!(ws.timing_path(), PathBuf::from("/work/job-1/timing.json"));
        assert_eq!(
            ws.segment_clip_path(7),
            PathBuf::from("/work/job-1/assembly/seg_0007.mp4")
        );
        assert_eq!(
            ws.frames_dir(1),
            PathBuf::from("/work/job-1/frames_1fps")
        );
    }

    #[tokio::test]
    async fn test_ensure_creates_tree() {
        let dir = TempDir::new().unwrap();
        let ws = JobWorkspace::new(dir.path().join("job"));
        ws.ensure().await.unwrap();
        assert!(ws.assembly_dir().is_dir());
    }
}
