//! Timing reconciliation and multi-track assembly engine.
//!
//! Re-times and re-assembles a narrated slide video after its speech track
//! has been translated, where the translated speech runs on different
//! timing than the original:
//!
//! - [`classifier`] scores sampled frames against reference slide images
//! - [`segmenter`] denoises and groups matches into a slide timeline
//! - [`mapper`] places translated speech segments onto that timeline
//! - [`reconciler`] fits each segment's audio into its allotted slot
//! - [`mixer`] assembles the narration track at absolute offsets
//! - [`stitcher`] merges rendered slide clips with crossfade transitions
//! - [`pipeline`] runs the stages in order with idempotent resume
//! - [`pacing`] offers the audio-paced alternative, where each slide shows
//!   for as long as its narration runs

pub mod classifier;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod mixer;
pub mod pacing;
pub mod pipeline;
pub mod reconciler;
pub mod segmenter;
pub mod status;
pub mod stitcher;
pub mod workspace;

pub use classifier::{load_reference_slides, FrameClassifier, ReferenceSlide};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use pipeline::{AssemblyInputs, AssemblyPipeline, JobSummary};
pub use status::{JsonStatusStore, StatusStore};
pub use stitcher::StitchOutcome;
pub use workspace::JobWorkspace;
