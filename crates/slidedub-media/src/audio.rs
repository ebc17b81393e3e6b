//! Single-purpose audio operations.
//!
//! Each function is one blocking FFmpeg invocation with a fixed argument
//! contract: explicit durations everywhere, and the sample rate / channel
//! layout of any generated silence taken from the render configuration.

use std::path::Path;
use tracing::debug;

use slidedub_models::RenderConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::concat::write_concat_list;
use crate::error::{MediaError, MediaResult};

/// Create a silent audio file of the given duration.
pub async fn create_silence(
    duration: f64,
    config: &RenderConfig,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(output.as_ref())
        .lavfi_input(format!("{}:d={}", config.silence_source(), duration))
        .duration(duration);
    FfmpegRunner::new().run(&cmd).await
}

/// Speed up audio by `tempo` (pitch-preserving).
///
/// `atempo` accepts factors in [0.5, 2.0]; duration-fitting only ever asks
/// for mild speed-ups well inside that range.
pub async fn adjust_tempo(
    input: impl AsRef<Path>,
    tempo: f64,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let input = input.as_ref();
    if !(0.5..=2.0).contains(&tempo) {
        return Err(MediaError::InvalidMedia(format!(
            "atempo factor {:.4} outside [0.5, 2.0]",
            tempo
        )));
    }

    debug!(tempo = tempo, input = %input.display(), "Adjusting audio tempo");

    let cmd = FfmpegCommand::new(output.as_ref())
        .input(input)
        .output_args(["-af".to_string(), format!("atempo={:.4}", tempo)]);
    FfmpegRunner::new().run(&cmd).await
}

/// Truncate audio to `duration` seconds with a fade-out ending exactly at
/// the cut point, avoiding an audible click.
pub async fn truncate_with_fade(
    input: impl AsRef<Path>,
    duration: f64,
    fade_ms: u64,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let fade_secs = fade_ms as f64 / 1000.0;
    let fade_start = (duration - fade_secs).max(0.0);

    let cmd = FfmpegCommand::new(output.as_ref())
        .input(input.as_ref())
        .duration(duration)
        .output_args([
            "-af".to_string(),
            format!("afade=t=out:st={:.3}:d={:.3}", fade_start, fade_secs),
        ]);
    FfmpegRunner::new().run(&cmd).await
}

/// Concatenate audio files with a fixed silence gap between them.
///
/// A single input is transcoded straight through. For multiple inputs a
/// shared gap-silence file is generated next to the output and interleaved
/// via the concat demuxer.
pub async fn concat_with_gaps(
    inputs: &[impl AsRef<Path>],
    gap: f64,
    config: &RenderConfig,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let output = output.as_ref();

    if inputs.is_empty() {
        return Err(MediaError::InvalidMedia(
            "no audio inputs to concatenate".to_string(),
        ));
    }

    if inputs.len() == 1 {
        let cmd = FfmpegCommand::new(output)
            .input(inputs[0].as_ref())
            .output_args(config.audio_args());
        return FfmpegRunner::new().run(&cmd).await;
    }

    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    let gap_path = parent.join("gap_silence.wav");
    if gap > 0.0 && !gap_path.exists() {
        create_silence(gap, config, &gap_path).await?;
    }

    let mut entries: Vec<&Path> = Vec::new();
    for (i, input) in inputs.iter().enumerate() {
        entries.push(input.as_ref());
        if gap > 0.0 && i < inputs.len() - 1 {
            entries.push(&gap_path);
        }
    }

    let list_path = parent.join(format!(
        "{}_list.txt",
        output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("concat")
    ));
    write_concat_list(&entries, &list_path).await?;

    let cmd = FfmpegCommand::new(output)
        .concat_list_input(&list_path)
        .output_args(config.audio_args());
    let result = FfmpegRunner::new().run(&cmd).await;

    let _ = tokio::fs::remove_file(&list_path).await;
    result
}

/// Surround an audio clip with leading and trailing silence.
pub async fn pad_audio(
    input: impl AsRef<Path>,
    pad_before: f64,
    pad_after: f64,
    config: &RenderConfig,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(output.as_ref())
        .lavfi_input(config.silence_source())
        .input(input.as_ref())
        .lavfi_input(config.silence_source())
        .filter_complex(format!(
            "[0:a]atrim=0:{pre}[pre];[2:a]atrim=0:{post}[post];[pre][1:a][post]concat=n=3:v=0:a=1[out]",
            pre = pad_before,
            post = pad_after,
        ))
        .map("[out]")
        .output_args(config.audio_args());
    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_adjust_tempo_rejects_out_of_range() {
        let err = adjust_tempo("in.mp3", 2.5, "out.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }

    #[tokio::test]
    async fn test_concat_rejects_empty_input() {
        let inputs: Vec<&Path> = Vec::new();
        let err = concat_with_gaps(&inputs, 0.15, &RenderConfig::default(), "out.aac")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }
}
