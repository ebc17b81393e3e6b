//! Render/encoding configuration for generated video and audio.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Output frame size matching the reference slide exports
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
/// Output frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Sample rate for generated silence and mixed tracks
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Channel layout for generated silence and mixed tracks
pub const DEFAULT_CHANNEL_LAYOUT: &str = "stereo";

/// Encoding configuration for rendered clips and the final output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Sample rate for generated audio (silence, mixes)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Channel layout for generated audio
    #[serde(default = "default_channel_layout")]
    pub channel_layout: String,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}
fn default_channel_layout() -> String {
    DEFAULT_CHANNEL_LAYOUT.to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channel_layout: DEFAULT_CHANNEL_LAYOUT.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `anullsrc` source spec for generated silence at this configuration.
    pub fn silence_source(&self) -> String {
        format!("anullsrc=r={}:cl={}", self.sample_rate, self.channel_layout)
    }

    /// `color` source spec for a black frame at this configuration.
    pub fn black_source(&self) -> String {
        format!(
            "color=c=black:s={}x{}:r={}",
            self.width, self.height, self.fps
        )
    }

    /// Scale-and-format video filter applied to rendered still images.
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{},format=yuv420p", self.width, self.height)
    }

    /// Video encoding arguments shared by every rendering call.
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-r".to_string(),
            self.fps.to_string(),
        ]
    }

    /// Audio encoding arguments shared by every rendering call.
    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}
