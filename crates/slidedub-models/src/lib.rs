//! Shared data models for the SlideDub assembly engine.
//!
//! This crate provides Serde-serializable types for:
//! - Slide timelines and per-sample classification results
//! - Speech segments and duration reconciliation outcomes
//! - Pipeline stage status records
//! - Render/encoding configuration

pub mod encoding;
pub mod speech;
pub mod stage;
pub mod timeline;
pub mod video;

// Re-export common types
pub use encoding::RenderConfig;
pub use speech::{ReconcileAction, ReconciledSegment, SpeechSegment};
pub use stage::{StageState, StageStatus};
pub use timeline::{SampleMatch, TimelineError, TimelineSegment, TimingDocument};
pub use video::VideoSegmentSpec;
