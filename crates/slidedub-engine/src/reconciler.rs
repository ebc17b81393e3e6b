//! Duration reconciliation: fit each synthesized segment into its slot.

use std::path::Path;
use tracing::{debug, warn};

use slidedub_media::audio;
use slidedub_models::{ReconcileAction, ReconciledSegment, SpeechSegment};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// What to do with one segment, decided purely from its durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcilePlan {
    /// Natural audio fits the slot.
    AsIs,
    /// Tempo-compress by this factor so the result lands exactly on the slot.
    SpeedUp { tempo: f64 },
    /// Cut to the slot duration with a fade-out.
    Truncate { duration: f64 },
}

impl ReconcilePlan {
    pub fn action(&self) -> ReconcileAction {
        match self {
            ReconcilePlan::AsIs => ReconcileAction::AsIs,
            ReconcilePlan::SpeedUp { .. } => ReconcileAction::SpedUp,
            ReconcilePlan::Truncate { .. } => ReconcileAction::Truncated,
        }
    }
}

/// Decide how to fit `natural_duration` into a slot of `slot_duration`.
///
/// Returns `None` for a zero/negative slot; the segment is skipped rather
/// than failing the job.
pub fn plan(natural_duration: f64, slot_duration: f64, max_tempo: f64) -> Option<ReconcilePlan> {
    if slot_duration <= 0.0 {
        return None;
    }

    let ratio = natural_duration / slot_duration;
    if ratio <= 1.0 {
        Some(ReconcilePlan::AsIs)
    } else if ratio <= max_tempo {
        Some(ReconcilePlan::SpeedUp { tempo: ratio })
    } else {
        Some(ReconcilePlan::Truncate {
            duration: slot_duration,
        })
    }
}

/// Reconcile one segment, producing the audio artifact to place on the
/// final track.
///
/// Derived artifacts are memoized by deterministic filename in `work_dir`;
/// an existing artifact is reused without invoking the transcoder again.
/// Returns `Ok(None)` when the segment is skipped for a bad slot.
pub async fn reconcile_segment(
    segment: &SpeechSegment,
    config: &EngineConfig,
    work_dir: &Path,
) -> EngineResult<Option<ReconciledSegment>> {
    let slot = segment.slot_duration();
    let Some(plan) = plan(segment.natural_duration, slot, config.max_tempo) else {
        warn!(
            segment = segment.index,
            slot = format!("{:.3}s", slot),
            "Segment has zero/negative slot duration, skipping"
        );
        return Ok(None);
    };

    let reconciled = match plan {
        ReconcilePlan::AsIs => ReconciledSegment {
            segment: segment.clone(),
            artifact: segment.audio_path.clone(),
            action: ReconcileAction::AsIs,
        },
        ReconcilePlan::SpeedUp { tempo } => {
            let out = work_dir.join(format!("adj_{:04}.mp3", segment.index));
            if out.exists() {
                debug!(segment = segment.index, "Tempo-adjusted artifact cached");
            } else {
                audio::adjust_tempo(&segment.audio_path, tempo, &out).await?;
            }
            ReconciledSegment {
                segment: segment.clone(),
                artifact: out,
                action: ReconcileAction::SpedUp,
            }
        }
        ReconcilePlan::Truncate { duration } => {
            warn!(
                segment = segment.index,
                overrun = format!("{:.0}%", (segment.overrun_ratio() - 1.0) * 100.0),
                natural = format!("{:.2}s", segment.natural_duration),
                slot = format!("{:.2}s", duration),
                "Segment too long to speed up, truncating"
            );
            let out = work_dir.join(format!("trunc_{:04}.mp3", segment.index));
            if !out.exists() {
                audio::truncate_with_fade(&segment.audio_path, duration, config.fade_ms, &out)
                    .await?;
            }
            ReconciledSegment {
                segment: segment.clone(),
                artifact: out,
                action: ReconcileAction::Truncated,
            }
        }
    };

    Ok(Some(reconciled))
}

/// Reconcile every segment, skipping those with unusable slots.
///
/// Fails only when a non-empty input yields nothing usable at all.
pub async fn reconcile_all(
    segments: &[SpeechSegment],
    config: &EngineConfig,
    work_dir: &Path,
) -> EngineResult<Vec<ReconciledSegment>> {
    let mut reconciled = Vec::with_capacity(segments.len());

    for segment in segments {
        if let Some(r) = reconcile_segment(segment, config, work_dir).await? {
            reconciled.push(r);
        }
    }

    if reconciled.is_empty() && !segments.is_empty() {
        return Err(EngineError::NoUsableOutput {
            stage: "reconcile",
        });
    }

    let truncated = reconciled.iter().filter(|r| r.action.is_lossy()).count();
    if truncated > 0 {
        warn!(
            truncated,
            total = reconciled.len(),
            "Some segments lost spoken content to truncation"
        );
    }

    Ok(reconciled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_fits_as_is() {
        assert_eq!(plan(3.6, 4.0, 1.15), Some(ReconcilePlan::AsIs));
    }

    #[test]
    fn test_plan_exact_fit_is_as_is() {
        assert_eq!(plan(4.0, 4.0, 1.15), Some(ReconcilePlan::AsIs));
    }

    #[test]
    fn test_plan_mild_overrun_speeds_up() {
        let plan = plan(4.4, 4.0, 1.15).unwrap();
        match plan {
            ReconcilePlan::SpeedUp { tempo } => {
                assert!((tempo - 1.1).abs() < 1e-9);
                // Sped-up duration lands on the slot within rounding
                assert!((4.4 / tempo - 4.0).abs() < 0.01);
            }
            other => panic!("expected SpeedUp, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_boundary_ratio_still_speeds_up() {
        assert!(matches!(
            plan(4.6, 4.0, 1.15),
            Some(ReconcilePlan::SpeedUp { .. })
        ));
    }

    #[test]
    fn test_plan_large_overrun_truncates() {
        let plan = plan(6.0, 4.0, 1.15).unwrap();
        assert_eq!(plan, ReconcilePlan::Truncate { duration: 4.0 });
        assert_eq!(plan.action(), ReconcileAction::Truncated);
    }

    #[test]
    fn test_plan_rejects_bad_slot() {
        assert_eq!(plan(2.0, 0.0, 1.15), None);
        assert_eq!(plan(2.0, -1.0, 1.15), None);
    }
}
