//! Concat-demuxer concatenation and final muxing.

use std::path::Path;
use tracing::{debug, info};

use slidedub_models::RenderConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Write a concat-demuxer list file for the given inputs.
///
/// Paths are written with forward slashes and single quotes escaped the way
/// the demuxer expects.
pub async fn write_concat_list(
    inputs: &[impl AsRef<Path>],
    list_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let mut content = String::new();
    for input in inputs {
        content.push_str(&format!("file '{}'\n", escape_concat_path(input.as_ref())));
    }
    tokio::fs::write(list_path.as_ref(), content).await?;
    Ok(())
}

fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', "'\\''")
}

/// Concatenate video clips with hard cuts, re-encoding to the configured
/// codec so mixed-origin segments are normalized.
pub async fn concat_clips(
    inputs: &[impl AsRef<Path>],
    config: &RenderConfig,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let output = output.as_ref();

    if inputs.is_empty() {
        return Err(MediaError::InvalidMedia(
            "no clips to concatenate".to_string(),
        ));
    }

    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    let list_path = parent.join("concat_list.txt");
    write_concat_list(inputs, &list_path).await?;

    debug!(clips = inputs.len(), output = %output.display(), "Concatenating clips");

    let cmd = FfmpegCommand::new(output)
        .concat_list_input(&list_path)
        .output_args(config.video_args())
        .output_args(config.audio_args());
    let result = FfmpegRunner::new().run(&cmd).await;

    let _ = tokio::fs::remove_file(&list_path).await;
    result
}

/// Mux a video track and an audio track into the final container.
///
/// Video is stream-copied; audio is encoded to the configured codec. The
/// output stops at the shorter track.
pub async fn mux_tracks(
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    config: &RenderConfig,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let video = video.as_ref();
    let audio = audio.as_ref();
    let output = output.as_ref();

    info!(
        video = %video.display(),
        audio = %audio.display(),
        output = %output.display(),
        "Muxing video and audio"
    );

    let cmd = FfmpegCommand::new(output)
        .input(video)
        .input(audio)
        .map("0:v:0")
        .map("1:a:0")
        .video_codec("copy")
        .output_args(config.audio_args())
        .shortest();
    FfmpegRunner::new().run(&cmd).await
}
