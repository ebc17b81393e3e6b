//! Audio-paced assembly: each slide shows exactly as long as the narrator
//! speaks about it.
//!
//! This is the alternative to re-timing against the reference video. The
//! speech segments mapped to one slide are concatenated (with small gaps),
//! padded with silence, and the slide's clip is rendered to that length
//! with the narration embedded. The clips then merge with crossfade
//! transitions, so the output's pacing follows the translated narration
//! instead of the original timeline.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use slidedub_media::{audio, probe, render};
use slidedub_models::{SpeechSegment, TimingDocument, VideoSegmentSpec};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::mapper;
use crate::stitcher::{self, StitchOutcome};
use crate::workspace::JobWorkspace;

/// Black lead-in before the first slide (seconds).
const INTRO_PADDING: f64 = 2.0;
/// Black tail after the last slide (seconds).
const OUTRO_PADDING: f64 = 2.0;
/// Silence before narration starts on each slide (seconds).
const SLIDE_PAD_BEFORE: f64 = 2.0;
/// Silence after narration ends on each slide (seconds).
const SLIDE_PAD_AFTER: f64 = 2.0;

/// All narration belonging to one slide, in transcript order.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideAudio {
    pub label: Option<u32>,
    pub inputs: Vec<PathBuf>,
}

/// Group speech segments by slide, ordered by each slide's first appearance
/// on the reference timeline.
///
/// Segments mapped to a slide that never appears on the reference timeline
/// cannot happen by construction (labels come from that timeline); segments
/// mapped to `None` group under the black pseudo-slide.
pub fn group_by_slide(
    timeline: &[slidedub_models::TimelineSegment],
    segments: &[SpeechSegment],
    labels: &[Option<u32>],
) -> Vec<SlideAudio> {
    debug_assert_eq!(segments.len(), labels.len());

    let mut order: Vec<Option<u32>> = Vec::new();
    for seg in timeline {
        if !order.contains(&seg.label) {
            order.push(seg.label);
        }
    }

    order
        .into_iter()
        .map(|label| SlideAudio {
            label,
            inputs: segments
                .iter()
                .zip(labels)
                .filter(|(_, l)| **l == label)
                .map(|(seg, _)| seg.audio_path.clone())
                .collect(),
        })
        .collect()
}

/// The on-screen length of a slide: padding around its narration.
pub fn paced_duration(audio_duration: f64) -> f64 {
    SLIDE_PAD_BEFORE + audio_duration + SLIDE_PAD_AFTER
}

/// Assemble an audio-paced video from the reference timeline and the
/// translated speech segments.
///
/// Slides without any narration are skipped and reported. Per-slide audio
/// and clip artifacts are memoized in the job workspace, so a restarted job
/// re-renders only what is missing.
pub async fn assemble_paced(
    timing: &TimingDocument,
    speech: &[SpeechSegment],
    slides_dir: &Path,
    config: &EngineConfig,
    workspace: &JobWorkspace,
    output: impl AsRef<Path>,
) -> EngineResult<StitchOutcome> {
    let output = output.as_ref();
    let assembly_dir = workspace.assembly_dir();

    let labels = mapper::map_segments(&timing.segments, speech);
    let groups = group_by_slide(&timing.segments, speech, &labels);

    let mut clips: Vec<PathBuf> = Vec::new();

    if INTRO_PADDING > 0.0 {
        let intro = assembly_dir.join("intro_black.mp4");
        if !intro.exists() {
            render::render_still_clip(
                &VideoSegmentSpec::black(INTRO_PADDING),
                None,
                &config.render,
                &intro,
            )
            .await?;
        }
        clips.push(intro);
    }

    for group in &groups {
        if group.inputs.is_empty() {
            warn!(label = ?group.label, "Slide has no narration, skipping");
            continue;
        }

        let name = match group.label {
            Some(label) => format!("slide_{:02}", label),
            None => "black".to_string(),
        };

        // Raw narration for this slide, then silence-padded to pacing
        let raw_audio = assembly_dir.join(format!("{}_audio_raw.aac", name));
        if !raw_audio.exists() {
            audio::concat_with_gaps(&group.inputs, config.segment_gap, &config.render, &raw_audio)
                .await?;
        }
        let audio_duration = probe::get_duration(&raw_audio).await?;

        let padded_audio = assembly_dir.join(format!("{}_audio.aac", name));
        if !padded_audio.exists() {
            audio::pad_audio(
                &raw_audio,
                SLIDE_PAD_BEFORE,
                SLIDE_PAD_AFTER,
                &config.render,
                &padded_audio,
            )
            .await?;
        }

        let duration = paced_duration(audio_duration);
        debug!(
            label = ?group.label,
            segments = group.inputs.len(),
            duration = format!("{:.1}s", duration),
            "Paced slide"
        );

        let image = match group.label {
            Some(label) => {
                let path = slides_dir.join(format!("slide_{:02}.png", label));
                if path.exists() {
                    Some(path)
                } else {
                    warn!(label, "Slide image not found, rendering black");
                    None
                }
            }
            None => None,
        };

        let clip = assembly_dir.join(format!("{}_video.mp4", name));
        if !clip.exists() {
            render::render_still_clip(
                &VideoSegmentSpec::new(image, duration),
                Some(&padded_audio),
                &config.render,
                &clip,
            )
            .await?;
        }
        clips.push(clip);
    }

    if OUTRO_PADDING > 0.0 {
        let outro = assembly_dir.join("outro_black.mp4");
        if !outro.exists() {
            render::render_still_clip(
                &VideoSegmentSpec::black(OUTRO_PADDING),
                None,
                &config.render,
                &outro,
            )
            .await?;
        }
        clips.push(outro);
    }

    // Intro and outro alone mean nothing was narrated
    if groups.iter().all(|g| g.inputs.is_empty()) {
        return Err(EngineError::NoUsableOutput { stage: "pacing" });
    }

    let outcome = stitcher::stitch_segments(&clips, config, &assembly_dir, output).await?;
    info!(
        slides = groups.len(),
        clips = clips.len(),
        outcome = ?outcome,
        output = %output.display(),
        "Paced assembly complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidedub_models::TimelineSegment;

    fn speech(index: usize, start: f64, end: f64) -> SpeechSegment {
        SpeechSegment {
            index,
            start,
            end,
            natural_duration: end - start,
            audio_path: PathBuf::from(format!("synth_{:04}.mp3", index)),
        }
    }

    #[test]
    fn test_group_by_slide_preserves_timeline_order() {
        let timeline = vec![
            TimelineSegment::new(Some(2), 0.0, 5.0),
            TimelineSegment::new(Some(1), 5.0, 9.0),
            TimelineSegment::new(Some(2), 9.0, 12.0),
        ];
        let segments = vec![speech(0, 1.0, 2.0), speech(1, 6.0, 7.0), speech(2, 10.0, 11.0)];
        let labels = vec![Some(2), Some(1), Some(2)];

        let groups = group_by_slide(&timeline, &segments, &labels);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, Some(2));
        assert_eq!(groups[0].inputs.len(), 2);
        assert_eq!(groups[1].label, Some(1));
        assert_eq!(groups[1].inputs.len(), 1);
    }

    #[test]
    fn test_group_by_slide_keeps_transcript_order_within_slide() {
        let timeline = vec![TimelineSegment::new(Some(1), 0.0, 10.0)];
        let segments = vec![speech(0, 1.0, 2.0), speech(1, 3.0, 4.0)];
        let labels = vec![Some(1), Some(1)];

        let groups = group_by_slide(&timeline, &segments, &labels);
        assert_eq!(
            groups[0].inputs,
            vec![
                PathBuf::from("synth_0000.mp3"),
                PathBuf::from("synth_0001.mp3")
            ]
        );
    }

    #[test]
    fn test_unnarrated_slide_gets_empty_group() {
        let timeline = vec![
            TimelineSegment::new(Some(1), 0.0, 5.0),
            TimelineSegment::new(Some(2), 5.0, 10.0),
        ];
        let segments = vec![speech(0, 1.0, 2.0)];
        let labels = vec![Some(1)];

        let groups = group_by_slide(&timeline, &segments, &labels);
        assert_eq!(groups[1].label, Some(2));
        assert!(groups[1].inputs.is_empty());
    }

    #[test]
    fn test_paced_duration_includes_padding() {
        assert!((paced_duration(10.0) - 14.0).abs() < 1e-9);
    }
}
