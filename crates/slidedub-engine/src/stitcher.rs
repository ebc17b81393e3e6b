//! Transition stitching: merge rendered segments into one output with
//! crossfade transitions, falling back to hard cuts when the crossfade
//! render fails.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use slidedub_media::{concat, fs_utils, probe, FfmpegCommand, FfmpegRunner};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// How the final output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchOutcome {
    /// Segments merged with crossfade transitions.
    Crossfaded,
    /// Segments concatenated with hard cuts (transitions disabled or the
    /// crossfade render failed).
    HardCut,
}

/// Crossfade offsets for merging `durations.len()` clips left to right.
///
/// The first overlap begins `fade` seconds before the first clip ends; each
/// later offset advances by the preceding clip's duration minus the overlap
/// it loses. An explicit fold keeps resource use flat for long decks.
pub fn crossfade_offsets(durations: &[f64], fade: f64) -> Vec<f64> {
    if durations.len() < 2 {
        return Vec::new();
    }

    let mut offsets = Vec::with_capacity(durations.len() - 1);
    let mut offset = durations[0] - fade;
    offsets.push(offset);

    for duration in &durations[1..durations.len() - 1] {
        offset += duration - fade;
        offsets.push(offset);
    }

    offsets
}

/// Total duration of the crossfaded output: each of the `n - 1` overlaps
/// collapses `fade` seconds.
pub fn stitched_duration(durations: &[f64], fade: f64) -> f64 {
    let total: f64 = durations.iter().sum();
    if durations.len() < 2 {
        total
    } else {
        total - (durations.len() - 1) as f64 * fade
    }
}

/// Build the paired video+audio crossfade graph for `offsets.len() + 1`
/// inputs.
///
/// Video transitions are `xfade` at the computed offsets; audio uses a
/// triangular `acrossfade` at the same boundaries so the tracks stay in
/// sync. The last link in each chain feeds `[vout]`/`[aout]`.
pub fn build_crossfade_graph(offsets: &[f64], fade: f64) -> String {
    let n = offsets.len() + 1;
    let mut video_parts = Vec::with_capacity(offsets.len());
    let mut audio_parts = Vec::with_capacity(offsets.len());

    for (i, offset) in offsets.iter().enumerate() {
        let v_in = if i == 0 {
            "[0:v]".to_string()
        } else {
            format!("[v{}]", i)
        };
        let a_in = if i == 0 {
            "[0:a]".to_string()
        } else {
            format!("[a{}]", i)
        };
        let (v_out, a_out) = if i == offsets.len() - 1 {
            ("[vout]".to_string(), "[aout]".to_string())
        } else {
            (format!("[v{}]", i + 1), format!("[a{}]", i + 1))
        };

        video_parts.push(format!(
            "{}[{}:v]xfade=transition=fade:duration={}:offset={:.3}{}",
            v_in,
            i + 1,
            fade,
            offset,
            v_out
        ));
        audio_parts.push(format!(
            "{}[{}:a]acrossfade=d={}:c1=tri:c2=tri{}",
            a_in,
            i + 1,
            fade,
            a_out
        ));
    }

    debug_assert_eq!(video_parts.len(), n - 1);
    video_parts
        .into_iter()
        .chain(audio_parts)
        .collect::<Vec<_>>()
        .join(";")
}

/// Stitch rendered segments into `output`.
///
/// A single segment is re-encoded straight through. With transitions
/// enabled, all segments merge in one chained-crossfade invocation; if that
/// invocation fails the whole output falls back to a hard-cut concatenation
/// of the original segments — never a partial mix of the two. The final
/// artifact is placed atomically.
pub async fn stitch_segments(
    inputs: &[PathBuf],
    config: &EngineConfig,
    work_dir: &Path,
    output: impl AsRef<Path>,
) -> EngineResult<StitchOutcome> {
    let output = output.as_ref();

    if inputs.is_empty() {
        return Err(EngineError::input("no segments to stitch"));
    }

    let partial = work_dir.join("stitched_partial.mp4");

    if inputs.len() == 1 {
        let cmd = FfmpegCommand::new(&partial)
            .input(&inputs[0])
            .output_args(config.render.video_args())
            .output_args(config.render.audio_args());
        FfmpegRunner::new().run(&cmd).await?;
        fs_utils::place_artifact(&partial, output).await?;
        return Ok(StitchOutcome::Crossfaded);
    }

    let fade = config.transition_duration;
    if fade <= 0.0 {
        concat::concat_clips(inputs, &config.render, &partial).await?;
        fs_utils::place_artifact(&partial, output).await?;
        return Ok(StitchOutcome::HardCut);
    }

    let mut durations = Vec::with_capacity(inputs.len());
    for input in inputs {
        durations.push(probe::get_duration(input).await?);
    }

    let offsets = crossfade_offsets(&durations, fade);
    let graph = build_crossfade_graph(&offsets, fade);

    let mut cmd = FfmpegCommand::new(&partial);
    for input in inputs {
        cmd = cmd.input(input);
    }
    cmd = cmd
        .filter_complex(graph)
        .map("[vout]")
        .map("[aout]")
        .output_args(config.render.video_args())
        .output_args(config.render.audio_args());

    match FfmpegRunner::new().run(&cmd).await {
        Ok(()) => {
            fs_utils::place_artifact(&partial, output).await?;
            info!(
                segments = inputs.len(),
                fade = fade,
                "Stitched segments with crossfade transitions"
            );
            Ok(StitchOutcome::Crossfaded)
        }
        Err(e) => {
            warn!(
                error = %e,
                detail = e.stderr_tail().unwrap_or(""),
                "Crossfade stitch failed, falling back to hard-cut concat"
            );
            concat::concat_clips(inputs, &config.render, &partial).await?;
            fs_utils::place_artifact(&partial, output).await?;
            Ok(StitchOutcome::HardCut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_for_three_equal_clips() {
        let offsets = crossfade_offsets(&[5.0, 5.0, 5.0], 0.5);
        assert_eq!(offsets.len(), 2);
        assert!((offsets[0] - 4.5).abs() < 1e-9);
        assert!((offsets[1] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_offsets_accumulate_uneven_durations() {
        let offsets = crossfade_offsets(&[3.0, 7.0, 2.0, 4.0], 1.0);
        assert_eq!(offsets.len(), 3);
        assert!((offsets[0] - 2.0).abs() < 1e-9);
        assert!((offsets[1] - 8.0).abs() < 1e-9);
        assert!((offsets[2] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_offsets_trivial_inputs() {
        assert!(crossfade_offsets(&[], 0.5).is_empty());
        assert!(crossfade_offsets(&[5.0], 0.5).is_empty());
    }

    #[test]
    fn test_stitched_duration() {
        assert!((stitched_duration(&[5.0, 5.0, 5.0], 0.5) - 14.0).abs() < 1e-9);
        // Hard cut path keeps the full sum
        assert!((stitched_duration(&[5.0, 5.0, 5.0], 0.0) - 15.0).abs() < 1e-9);
        assert!((stitched_duration(&[5.0], 0.5) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_graph_two_inputs() {
        let graph = build_crossfade_graph(&[4.5], 0.5);
        assert_eq!(
            graph,
            "[0:v][1:v]xfade=transition=fade:duration=0.5:offset=4.500[vout];\
             [0:a][1:a]acrossfade=d=0.5:c1=tri:c2=tri[aout]"
        );
    }

    #[test]
    fn test_graph_chains_three_inputs() {
        let graph = build_crossfade_graph(&[4.5, 9.0], 0.5);
        assert!(graph.contains("[0:v][1:v]xfade=transition=fade:duration=0.5:offset=4.500[v1]"));
        assert!(graph.contains("[v1][2:v]xfade=transition=fade:duration=0.5:offset=9.000[vout]"));
        assert!(graph.contains("[0:a][1:a]acrossfade=d=0.5:c1=tri:c2=tri[a1]"));
        assert!(graph.contains("[a1][2:a]acrossfade=d=0.5:c1=tri:c2=tri[aout]"));
    }

    #[test]
    fn test_graph_video_and_audio_boundary_counts_match() {
        let offsets = crossfade_offsets(&[5.0; 6], 0.5);
        let graph = build_crossfade_graph(&offsets, 0.5);
        assert_eq!(graph.matches("xfade=").count(), 5);
        assert_eq!(graph.matches("acrossfade=").count(), 5);
    }
}
