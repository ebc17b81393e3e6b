//! Engine error types.

use std::path::PathBuf;
use thiserror::Error;

use slidedub_media::MediaError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during timing detection and assembly.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No reference slide images found in {0}")]
    NoReferenceSlides(PathBuf),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Stage '{stage}' produced no usable output")]
    NoUsableOutput { stage: &'static str },

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Whether this error came from an external transcoder invocation
    /// (non-zero exit or timeout), as opposed to configuration or input.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Media(e) if e.is_invocation_failure())
    }
}
