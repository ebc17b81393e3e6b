//! Per-job pipeline orchestration.
//!
//! Stages run strictly in dependency order: detect → map → reconcile → mix
//! → render → stitch → mux. Every stage checks for its output artifact
//! before recomputing, so a crashed job restarts where it left off; the
//! external calls are costly enough that this is a correctness requirement,
//! not an optimization.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use slidedub_media::{check_ffmpeg, check_ffprobe, concat, frames, fs_utils, probe, render};
use slidedub_models::{SpeechSegment, TimingDocument, VideoSegmentSpec};

use crate::classifier::{load_reference_slides, FrameClassifier};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::logging::StageLogger;
use crate::mapper;
use crate::mixer;
use crate::reconciler;
use crate::segmenter;
use crate::status::StatusStore;
use crate::stitcher::{self, StitchOutcome};
use crate::workspace::JobWorkspace;

pub const STAGE_DETECT: &str = "detect";
pub const STAGE_MAP: &str = "map";
pub const STAGE_RECONCILE: &str = "reconcile";
pub const STAGE_MIX: &str = "mix";
pub const STAGE_RENDER: &str = "render";
pub const STAGE_STITCH: &str = "stitch";
pub const STAGE_MUX: &str = "mux";

/// Inputs for one assembly job.
#[derive(Debug, Clone)]
pub struct AssemblyInputs {
    /// The original narrated video used as the timing reference.
    pub reference_video: PathBuf,
    /// Directory of reference slide exports (`slide_NN.png`).
    pub reference_slides_dir: PathBuf,
    /// Directory of translated slide exports to render into the output.
    pub target_slides_dir: PathBuf,
    /// Translated speech segments with natural durations.
    pub speech_segments: Vec<SpeechSegment>,
    /// Final output path.
    pub output: PathBuf,
}

/// Result summary for a completed job.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub output: PathBuf,
    /// Final output duration in seconds.
    pub duration: f64,
    /// Final output size in bytes.
    pub size_bytes: u64,
    /// Target timeline segments rendered.
    pub segments_rendered: usize,
    /// Units skipped for unusable input (reported, not hidden).
    pub segments_skipped: usize,
    /// Speech segments that lost content to truncation.
    pub truncated: usize,
    /// How the video track was stitched; `None` when a cached stitched
    /// artifact from a previous run was reused.
    pub stitch: Option<StitchOutcome>,
    /// Output duration minus reference duration.
    pub duration_delta: f64,
}

/// The per-job assembly pipeline.
pub struct AssemblyPipeline {
    job_id: String,
    config: EngineConfig,
    workspace: JobWorkspace,
}

impl AssemblyPipeline {
    pub fn new(job_id: impl Into<String>, config: EngineConfig, workspace: JobWorkspace) -> Self {
        Self {
            job_id: job_id.into(),
            config,
            workspace,
        }
    }

    /// Run the full pipeline, recording stage transitions in `store`.
    pub async fn run(
        &self,
        store: &mut dyn StatusStore,
        inputs: &AssemblyInputs,
    ) -> EngineResult<JobSummary> {
        // Missing tools are a configuration error; nothing runs.
        check_ffmpeg().map_err(|_| EngineError::config("FFmpeg not found in PATH"))?;
        check_ffprobe().map_err(|_| EngineError::config("FFprobe not found in PATH"))?;

        self.workspace.ensure().await?;
        info!(
            job_id = %self.job_id,
            video = %inputs.reference_video.display(),
            segments = inputs.speech_segments.len(),
            "Starting assembly job"
        );

        store.mark_running(STAGE_DETECT)?;
        let timing = record(store, STAGE_DETECT, self.detect_timing(inputs).await)?;

        store.mark_running(STAGE_MAP)?;
        let target = record(
            store,
            STAGE_MAP,
            self.derive_target(&timing, &inputs.speech_segments),
        )?;

        store.mark_running(STAGE_RECONCILE)?;
        let reconciled = record(
            store,
            STAGE_RECONCILE,
            reconciler::reconcile_all(
                &inputs.speech_segments,
                &self.config,
                &self.workspace.assembly_dir(),
            )
            .await,
        )?;
        let truncated = reconciled.iter().filter(|r| r.action.is_lossy()).count();
        let reconcile_skipped = inputs.speech_segments.len() - reconciled.len();

        store.mark_running(STAGE_MIX)?;
        let mixed_track = record(store, STAGE_MIX, {
            let track = self.workspace.mixed_track_path();
            if track.exists() {
                debug!(job_id = %self.job_id, "Mixed track cached");
                Ok(track)
            } else {
                mixer::mix_track(
                    &reconciled,
                    timing.duration,
                    &self.config,
                    &self.workspace.assembly_dir(),
                    &track,
                )
                .await
                .map(|()| track)
            }
        })?;

        store.mark_running(STAGE_RENDER)?;
        let (clips, render_skipped) = record(
            store,
            STAGE_RENDER,
            self.render_segments(&target, &inputs.target_slides_dir).await,
        )?;

        store.mark_running(STAGE_STITCH)?;
        let (stitched, stitch_outcome) = record(store, STAGE_STITCH, {
            let stitched = self.workspace.stitched_path();
            if stitched.exists() {
                debug!(job_id = %self.job_id, "Stitched video cached");
                Ok((stitched, None))
            } else {
                stitcher::stitch_segments(
                    &clips,
                    &self.config,
                    &self.workspace.assembly_dir(),
                    &stitched,
                )
                .await
                .map(|outcome| (stitched, Some(outcome)))
            }
        })?;

        store.mark_running(STAGE_MUX)?;
        record(store, STAGE_MUX, {
            let partial = self.workspace.assembly_dir().join("muxed_partial.mp4");
            match concat::mux_tracks(&stitched, &mixed_track, &self.config.render, &partial).await {
                Ok(()) => fs_utils::place_artifact(&partial, &inputs.output)
                    .await
                    .map_err(EngineError::from),
                Err(e) => Err(EngineError::from(e)),
            }
        })?;

        self.summarize(
            inputs,
            timing.duration,
            clips.len(),
            reconcile_skipped + render_skipped,
            truncated,
            stitch_outcome,
        )
        .await
    }

    /// Detect the reference slide timeline, memoized as `timing.json`.
    async fn detect_timing(&self, inputs: &AssemblyInputs) -> EngineResult<TimingDocument> {
        let timing_path = self.workspace.timing_path();
        if timing_path.exists() {
            debug!(job_id = %self.job_id, "Timing already detected, reusing");
            let content = tokio::fs::read_to_string(&timing_path).await?;
            return Ok(serde_json::from_str(&content)?);
        }

        let logger = StageLogger::new(&self.job_id, STAGE_DETECT);
        logger.log_start("detecting slide timeline from reference video");

        let duration = probe::get_duration(&inputs.reference_video).await?;

        let frames_dir = self.workspace.frames_dir(self.config.sample_fps);
        let frame_count = frames::extract_frames(
            &inputs.reference_video,
            &frames_dir,
            self.config.sample_fps,
            self.config.render.width,
            self.config.render.height,
        )
        .await?;
        logger.log_progress(&format!("{} frames sampled", frame_count));

        let slides = load_reference_slides(
            &inputs.reference_slides_dir,
            self.config.compare_width,
            self.config.compare_height,
        )?;
        let classifier = FrameClassifier::new(slides, self.config.ssim_threshold)?;

        let frame_files = frames::list_frames(&frames_dir)?;
        let matches = classifier.classify_files(
            &frame_files,
            self.config.compare_width,
            self.config.compare_height,
        )?;

        let segments =
            segmenter::build_timeline(&matches, duration, self.config.sample_interval());
        if segments.is_empty() {
            return Err(EngineError::NoUsableOutput {
                stage: STAGE_DETECT,
            });
        }

        let doc = TimingDocument::new(segments, duration);
        doc.validate().map_err(|e| EngineError::input(e.to_string()))?;

        tokio::fs::write(&timing_path, serde_json::to_string_pretty(&doc)?).await?;
        logger.log_completion(&format!(
            "{} segments, {} slides, {:.1}s",
            doc.segments.len(),
            doc.slide_count,
            doc.duration
        ));
        Ok(doc)
    }

    /// Derive the target slide timeline from the mapped speech segments,
    /// memoized as `timing_target.json`.
    fn derive_target(
        &self,
        timing: &TimingDocument,
        speech: &[SpeechSegment],
    ) -> EngineResult<TimingDocument> {
        let target_path = self.workspace.target_timing_path();
        if target_path.exists() {
            debug!(job_id = %self.job_id, "Target timing cached");
            let content = std::fs::read_to_string(&target_path)?;
            return Ok(serde_json::from_str(&content)?);
        }

        let labels = mapper::map_segments(&timing.segments, speech);
        let unmatched = labels.iter().filter(|l| l.is_none()).count();
        if unmatched > 0 {
            warn!(
                job_id = %self.job_id,
                unmatched,
                total = labels.len(),
                "Some speech segments fall outside every reference segment"
            );
        }

        let mut segments = mapper::derive_target_timeline(speech, &labels, timing.duration);
        if segments.is_empty() {
            warn!(
                job_id = %self.job_id,
                "No speech segments to derive timing from, reusing reference timeline"
            );
            segments = timing.segments.clone();
        }

        let doc = TimingDocument::new(segments, timing.duration);
        std::fs::write(&target_path, serde_json::to_string_pretty(&doc)?)?;
        Ok(doc)
    }

    /// Render one fixed-length clip per target timeline segment.
    ///
    /// A segment whose slide image is missing renders as black; a segment
    /// with a non-positive duration is skipped. Both are warned about, and
    /// a job that renders nothing at all fails.
    async fn render_segments(
        &self,
        target: &TimingDocument,
        slides_dir: &Path,
    ) -> EngineResult<(Vec<PathBuf>, usize)> {
        let logger = StageLogger::new(&self.job_id, STAGE_RENDER);
        let mut clips = Vec::with_capacity(target.segments.len());
        let mut skipped = 0usize;

        for (i, seg) in target.segments.iter().enumerate() {
            let duration = seg.duration();
            if duration <= 0.0 {
                logger.log_warning(&format!("segment {} has no duration, skipping", i));
                skipped += 1;
                continue;
            }

            let clip = self.workspace.segment_clip_path(i);
            if !clip.exists() {
                let image = seg.label.and_then(|label| {
                    let path = slides_dir.join(format!("slide_{:02}.png", label));
                    if path.exists() {
                        Some(path)
                    } else {
                        logger.log_warning(&format!(
                            "slide {} image not found, rendering black",
                            label
                        ));
                        None
                    }
                });

                let spec = VideoSegmentSpec::new(image, duration);
                render::render_still_clip(&spec, None, &self.config.render, &clip).await?;
            }
            clips.push(clip);
        }

        if clips.is_empty() {
            return Err(EngineError::NoUsableOutput {
                stage: STAGE_RENDER,
            });
        }

        logger.log_completion(&format!("{} clips rendered, {} skipped", clips.len(), skipped));
        Ok((clips, skipped))
    }

    /// Probe the finished output and report the final summary.
    async fn summarize(
        &self,
        inputs: &AssemblyInputs,
        reference_duration: f64,
        segments_rendered: usize,
        segments_skipped: usize,
        truncated: usize,
        stitch: Option<StitchOutcome>,
    ) -> EngineResult<JobSummary> {
        let info = probe::probe_media(&inputs.output).await?;
        let duration_delta = info.duration - reference_duration;

        if duration_delta.abs() > self.config.duration_tolerance {
            warn!(
                job_id = %self.job_id,
                output = format!("{:.1}s", info.duration),
                reference = format!("{:.1}s", reference_duration),
                delta = format!("{:+.1}s", duration_delta),
                "Output duration differs from reference"
            );
        }

        if segments_skipped > 0 {
            warn!(
                job_id = %self.job_id,
                skipped = segments_skipped,
                "Job finished with skipped units"
            );
        }

        info!(
            job_id = %self.job_id,
            output = %inputs.output.display(),
            duration = format!("{:.1}s", info.duration),
            size_mb = format!("{:.1}", info.size as f64 / (1024.0 * 1024.0)),
            "Assembly complete"
        );

        Ok(JobSummary {
            output: inputs.output.clone(),
            duration: info.duration,
            size_bytes: info.size,
            segments_rendered,
            segments_skipped,
            truncated,
            stitch,
            duration_delta,
        })
    }
}

/// Record a stage result in the status store and pass it through.
fn record<T>(
    store: &mut dyn StatusStore,
    stage: &str,
    result: EngineResult<T>,
) -> EngineResult<T> {
    match &result {
        Ok(_) => store.mark_completed(stage)?,
        Err(e) => store.mark_failed(stage, &e.to_string())?,
    }
    result
}
