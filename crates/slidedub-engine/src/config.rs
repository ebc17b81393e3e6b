//! Engine configuration.
//!
//! These parameters control slide detection, duration fitting, and track
//! assembly. The defaults match the reference exports the engine was built
//! against (1080p slides sampled at one frame per second).

use serde::{Deserialize, Serialize};

use slidedub_models::RenderConfig;

/// Configuration for the timing reconciliation and assembly engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum similarity score for a frame to count as matching a slide.
    ///
    /// Below this, the frame is classified as black/transition rather than
    /// risking a wrong slide assignment.
    pub ssim_threshold: f64,

    /// Frame sampling rate for slide detection (frames per second).
    pub sample_fps: u32,

    /// Width frames and reference slides are downscaled to before scoring.
    pub compare_width: u32,

    /// Height frames and reference slides are downscaled to before scoring.
    pub compare_height: u32,

    /// Maximum tempo factor before a too-long segment is truncated instead
    /// of sped up.
    pub max_tempo: f64,

    /// Fade-out applied to truncated segments (milliseconds).
    pub fade_ms: u64,

    /// Maximum audio inputs per mixing filter graph before batching.
    pub mix_batch_size: usize,

    /// Crossfade duration between stitched video segments (seconds).
    /// Zero disables transitions and concatenates with hard cuts.
    pub transition_duration: f64,

    /// Silence gap between audio segments grouped onto one slide (seconds).
    pub segment_gap: f64,

    /// Output duration may drift from the reference by this much before a
    /// mismatch warning is raised (seconds).
    pub duration_tolerance: f64,

    /// Encoding parameters for rendered clips and the final output.
    pub render: RenderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ssim_threshold: 0.40,
            sample_fps: 1,
            compare_width: 960,
            compare_height: 540,
            max_tempo: 1.15,
            fade_ms: 100,
            mix_batch_size: 25,
            transition_duration: 0.5,
            segment_gap: 0.15,
            duration_tolerance: 2.0,
            render: RenderConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ssim_threshold: env_parse("SLIDEDUB_SSIM_THRESHOLD", defaults.ssim_threshold),
            sample_fps: env_parse("SLIDEDUB_SAMPLE_FPS", defaults.sample_fps),
            compare_width: defaults.compare_width,
            compare_height: defaults.compare_height,
            max_tempo: env_parse("SLIDEDUB_MAX_TEMPO", defaults.max_tempo),
            fade_ms: env_parse("SLIDEDUB_FADE_MS", defaults.fade_ms),
            mix_batch_size: env_parse("SLIDEDUB_MIX_BATCH_SIZE", defaults.mix_batch_size),
            transition_duration: env_parse(
                "SLIDEDUB_TRANSITION_SECS",
                defaults.transition_duration,
            ),
            segment_gap: env_parse("SLIDEDUB_SEGMENT_GAP", defaults.segment_gap),
            duration_tolerance: defaults.duration_tolerance,
            render: RenderConfig::default(),
        }
    }

    /// Builder-style setter for the similarity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.ssim_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder-style setter for the maximum tempo factor.
    pub fn with_max_tempo(mut self, max_tempo: f64) -> Self {
        self.max_tempo = max_tempo.max(1.0);
        self
    }

    /// Builder-style setter for the mixing batch size.
    pub fn with_mix_batch_size(mut self, size: usize) -> Self {
        self.mix_batch_size = size.max(1);
        self
    }

    /// Builder-style setter for the crossfade duration.
    pub fn with_transition_duration(mut self, secs: f64) -> Self {
        self.transition_duration = secs.max(0.0);
        self
    }

    /// Seconds between consecutive samples on the detection grid.
    pub fn sample_interval(&self) -> f64 {
        1.0 / self.sample_fps as f64
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
