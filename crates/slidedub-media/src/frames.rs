//! Frame extraction at a fixed sample rate.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Filename prefix for extracted frames (`frame_00001.png` = sample 0).
const FRAME_PREFIX: &str = "frame_";

/// Extract frames from `video` at `fps` samples per second, scaled to
/// `width`x`height`, into `output_dir`.
///
/// If the directory already contains extracted frames they are reused and
/// re-counted instead of re-extracting; a crashed job resumes here for free.
/// Returns the number of frames available.
pub async fn extract_frames(
    video: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    fps: u32,
    width: u32,
    height: u32,
) -> MediaResult<usize> {
    let video = video.as_ref();
    let output_dir = output_dir.as_ref();

    let existing = list_frames(output_dir)?;
    if !existing.is_empty() {
        debug!(
            frames = existing.len(),
            dir = %output_dir.display(),
            "Frames already extracted, reusing"
        );
        return Ok(existing.len());
    }

    tokio::fs::create_dir_all(output_dir).await?;

    let pattern = output_dir.join(format!("{}%05d.png", FRAME_PREFIX));
    let cmd = FfmpegCommand::new(&pattern)
        .input(video)
        .video_filter(format!("fps={},scale={}:{}", fps, width, height))
        .output_args(["-q:v", "2"]);

    FfmpegRunner::new().run(&cmd).await?;

    let frames = list_frames(output_dir)?;
    info!(
        frames = frames.len(),
        video = %video.display(),
        "Extracted frames"
    );
    Ok(frames.len())
}

/// List extracted frame files in sample order.
pub fn list_frames(dir: impl AsRef<Path>) -> MediaResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "png")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FRAME_PREFIX))
        })
        .collect();

    frames.sort();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_frames_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["frame_00002.png", "frame_00001.png", "cover.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let frames = list_frames(dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with("frame_00001.png"));
        assert!(frames[1].ends_with("frame_00002.png"));
    }

    #[test]
    fn test_list_frames_missing_dir() {
        let frames = list_frames("/nonexistent/frames").unwrap();
        assert!(frames.is_empty());
    }
}
