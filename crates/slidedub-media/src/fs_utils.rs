//! Atomic placement of finished artifacts.
//!
//! Finished outputs are always written to a temporary path first and moved
//! into place, so a crash never leaves a partially-written final artifact.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move a finished artifact from `src` into its final location `dst`.
///
/// Attempts a rename first; on EXDEV (cross-device) falls back to copying
/// to a sibling temp file of `dst` and renaming, which is atomic on the
/// destination filesystem.
pub async fn place_artifact(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename, falling back to copy+rename: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_then_rename(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Check if an IO error is EXDEV (cross-device link).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_then_rename(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).await?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = std::fs::remove_file(&tmp_dst);
        return Err(MediaError::from(e));
    }

    // Source cleanup is best effort
    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(
            "Failed to remove source after cross-device move: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_place_artifact_same_filesystem() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("stitched.tmp.mp4");
        let dst = dir.path().join("final.mp4");

        fs::write(&src, b"clip bytes").await.unwrap();
        place_artifact(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"clip bytes");
    }

    #[tokio::test]
    async fn test_place_artifact_creates_parent() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("out.mp4");
        let dst = dir.path().join("nested").join("out.mp4");

        fs::write(&src, b"x").await.unwrap();
        place_artifact(&src, &dst).await.unwrap();

        assert!(dst.exists());
    }

    #[tokio::test]
    async fn test_place_artifact_overwrites() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("new.mp4");
        let dst = dir.path().join("old.mp4");

        fs::write(&src, b"new").await.unwrap();
        fs::write(&dst, b"old").await.unwrap();
        place_artifact(&src, &dst).await.unwrap();

        assert_eq!(fs::read(&dst).await.unwrap(), b"new");
    }
}
