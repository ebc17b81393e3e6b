//! Rendering still images into fixed-duration video clips.

use std::path::Path;
use tracing::debug;

use slidedub_models::{RenderConfig, VideoSegmentSpec};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Render a still-image segment (or black frame) into a fixed-duration clip.
///
/// With `audio = None` a silent track is generated so every rendered clip
/// carries both streams and can be concatenated or crossfaded uniformly.
pub async fn render_still_clip(
    spec: &VideoSegmentSpec,
    audio: Option<&Path>,
    config: &RenderConfig,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let output = output.as_ref();

    if spec.duration <= 0.0 {
        return Err(MediaError::InvalidMedia(format!(
            "cannot render a clip of duration {:.3}s",
            spec.duration
        )));
    }

    let mut cmd = FfmpegCommand::new(output);

    // Video source: looped still or generated black frame
    cmd = match &spec.image {
        Some(image) => {
            if !image.exists() {
                return Err(MediaError::FileNotFound(image.clone()));
            }
            cmd.loop_image_input(image)
                .video_filter(config.scale_filter())
        }
        None => cmd
            .lavfi_input(config.black_source())
            .video_filter("format=yuv420p"),
    };

    // Audio source: narration file or generated silence
    cmd = match audio {
        Some(path) => cmd.input(path),
        None => cmd.lavfi_input(config.silence_source()),
    };

    cmd = cmd
        .duration(spec.duration)
        .output_args(config.video_args())
        .output_args(config.audio_args())
        .shortest();

    debug!(
        duration = spec.duration,
        image = ?spec.image,
        output = %output.display(),
        "Rendering still clip"
    );

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_nonpositive_duration() {
        let spec = VideoSegmentSpec::black(0.0);
        let err = render_still_clip(&spec, None, &RenderConfig::default(), "out.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }

    #[tokio::test]
    async fn test_rejects_missing_image() {
        let spec = VideoSegmentSpec::new(Some("/nonexistent/slide_01.png".into()), 2.0);
        let err = render_still_clip(&spec, None, &RenderConfig::default(), "out.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
