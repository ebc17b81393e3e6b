//! Speech segment types and duration reconciliation outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A synthesized speech segment with its allotted slot on the target
/// timeline and the natural duration of its rendered audio.
///
/// `start`/`end` describe the slot the segment was allotted; they are never
/// mutated by the engine. `natural_duration` is how long the synthesized
/// audio actually runs, which may differ from the slot length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    /// Position of this segment in the transcript order.
    pub index: usize,
    /// Slot start on the target timeline, in seconds.
    pub start: f64,
    /// Slot end on the target timeline, in seconds.
    pub end: f64,
    /// Rendered length of the synthesized audio, in seconds.
    pub natural_duration: f64,
    /// Path to the synthesized audio artifact.
    pub audio_path: PathBuf,
}

impl SpeechSegment {
    /// The slot duration allotted to this segment.
    pub fn slot_duration(&self) -> f64 {
        self.end - self.start
    }

    /// Ratio of natural duration to slot duration.
    ///
    /// Only meaningful for a positive slot duration.
    pub fn overrun_ratio(&self) -> f64 {
        self.natural_duration / self.slot_duration()
    }
}

/// How a segment's natural duration was reconciled against its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Natural audio fits the slot; passed through unmodified.
    AsIs,
    /// Tempo-compressed (pitch-preserving) to exactly the slot duration.
    SpedUp,
    /// Cut to the slot duration with a fade-out; spoken content was lost.
    Truncated,
}

impl ReconcileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileAction::AsIs => "as_is",
            ReconcileAction::SpedUp => "sped_up",
            ReconcileAction::Truncated => "truncated",
        }
    }

    /// Whether this action dropped spoken content.
    pub fn is_lossy(&self) -> bool {
        matches!(self, ReconcileAction::Truncated)
    }
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A speech segment after duration reconciliation, pointing at the audio
/// artifact that should be placed on the final track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledSegment {
    /// The source segment (slot times unchanged).
    pub segment: SpeechSegment,
    /// The audio artifact to place at `segment.start`.
    pub artifact: PathBuf,
    /// What was done to fit the slot.
    pub action: ReconcileAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_segment(natural: f64, slot: f64) -> SpeechSegment {
        SpeechSegment {
            index: 0,
            start: 10.0,
            end: 10.0 + slot,
            natural_duration: natural,
            audio_path: PathBuf::from("seg_0000.mp3"),
        }
    }

    #[test]
    fn test_slot_duration_and_ratio() {
        let seg = make_segment(4.4, 4.0);
        assert!((seg.slot_duration() - 4.0).abs() < 1e-9);
        assert!((seg.overrun_ratio() - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_action_lossiness() {
        assert!(!ReconcileAction::AsIs.is_lossy());
        assert!(!ReconcileAction::SpedUp.is_lossy());
        assert!(ReconcileAction::Truncated.is_lossy());
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&ReconcileAction::SpedUp).unwrap();
        assert_eq!(json, "\"sped_up\"");
    }
}
