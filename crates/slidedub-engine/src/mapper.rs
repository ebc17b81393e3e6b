//! Mapping speech segments onto a reference slide timeline, and deriving
//! the target slide timeline from the mapped segments.

use tracing::debug;

use slidedub_models::{SpeechSegment, TimelineSegment};

/// Find the label of the reference segment containing time `t`.
///
/// Scans in order over half-open `[start, end)` ranges; first match wins.
/// Precondition: the reference segments are non-overlapping (guaranteed
/// when they come from the segmenter). Overlapping external timelines are
/// out of contract.
pub fn lookup_label(reference: &[TimelineSegment], t: f64) -> Option<u32> {
    reference
        .iter()
        .find(|seg| seg.contains(t))
        .and_then(|seg| seg.label)
}

/// Assign each speech segment the slide showing at its slot midpoint.
///
/// A midpoint outside every reference segment (e.g. rounding past the total
/// duration) maps to `None`. Midpoint matching is deliberate: an interval
/// straddling a slide boundary goes to whichever side holds its midpoint.
pub fn map_segments(
    reference: &[TimelineSegment],
    segments: &[SpeechSegment],
) -> Vec<Option<u32>> {
    segments
        .iter()
        .map(|seg| {
            let midpoint = (seg.start + seg.end) / 2.0;
            lookup_label(reference, midpoint)
        })
        .collect()
}

/// Derive the target slide timeline from mapped speech segments.
///
/// Consecutive segments mapped to the same slide form one run. Each run
/// spans from its first segment's slot start to the next run's start; the
/// first run is pulled back to 0 so any leading gap shows the opening
/// slide, and the last run is closed at the total duration. The result is
/// gap-free by construction.
pub fn derive_target_timeline(
    segments: &[SpeechSegment],
    labels: &[Option<u32>],
    total_duration: f64,
) -> Vec<TimelineSegment> {
    debug_assert_eq!(segments.len(), labels.len());

    let mut runs: Vec<(Option<u32>, f64)> = Vec::new();
    for (seg, label) in segments.iter().zip(labels) {
        match runs.last() {
            Some((last_label, _)) if last_label == label => {}
            _ => runs.push((*label, seg.start)),
        }
    }

    let mut timeline = Vec::with_capacity(runs.len());
    for (i, (label, start)) in runs.iter().enumerate() {
        let start = if i == 0 { 0.0 } else { *start };
        let end = runs
            .get(i + 1)
            .map(|(_, next_start)| *next_start)
            .unwrap_or(total_duration);
        if end > start {
            timeline.push(TimelineSegment::new(*label, start, end));
        }
    }

    debug!(
        segments = segments.len(),
        runs = timeline.len(),
        "Derived target slide timeline"
    );
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn reference() -> Vec<TimelineSegment> {
        vec![
            TimelineSegment::new(Some(1), 0.0, 3.0),
            TimelineSegment::new(None, 3.0, 4.0),
            TimelineSegment::new(Some(2), 4.0, 8.0),
            TimelineSegment::new(Some(1), 8.0, 10.0),
        ]
    }

    fn speech(index: usize, start: f64, end: f64) -> SpeechSegment {
        SpeechSegment {
            index,
            start,
            end,
            natural_duration: end - start,
            audio_path: PathBuf::from(format!("seg_{:04}.mp3", index)),
        }
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let reference = reference();
        assert_eq!(lookup_label(&reference, 1.5), Some(1));
        assert_eq!(lookup_label(&reference, 3.5), None);
        assert_eq!(lookup_label(&reference, 9.9), Some(1));
        assert_eq!(lookup_label(&reference, 10.0), None);
    }

    #[test]
    fn test_boundary_midpoint_goes_to_starting_segment() {
        // Midpoint exactly 4.0 falls in [4.0, 8.0), not [3.0, 4.0)
        let reference = reference();
        let segments = vec![speech(0, 3.0, 5.0)];
        assert_eq!(map_segments(&reference, &segments), vec![Some(2)]);
    }

    #[test]
    fn test_map_is_deterministic() {
        let reference = reference();
        let segments = vec![speech(0, 0.0, 2.0), speech(1, 4.2, 6.0), speech(2, 9.0, 9.5)];
        let a = map_segments(&reference, &segments);
        let b = map_segments(&reference, &segments);
        assert_eq!(a, b);
        assert_eq!(a, vec![Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn test_midpoint_past_duration_maps_to_none() {
        let reference = reference();
        let segments = vec![speech(0, 9.8, 10.4)];
        assert_eq!(map_segments(&reference, &segments), vec![None]);
    }

    #[test]
    fn test_derive_groups_consecutive_runs() {
        let segments = vec![
            speech(0, 1.0, 3.0),
            speech(1, 3.2, 5.0),
            speech(2, 5.5, 8.0),
            speech(3, 8.5, 11.0),
        ];
        let labels = vec![Some(1), Some(1), Some(2), Some(1)];

        let timeline = derive_target_timeline(&segments, &labels, 12.0);
        assert_eq!(
            timeline,
            vec![
                TimelineSegment::new(Some(1), 0.0, 5.5),
                TimelineSegment::new(Some(2), 5.5, 8.5),
                TimelineSegment::new(Some(1), 8.5, 12.0),
            ]
        );
    }

    #[test]
    fn test_derive_leading_gap_absorbed() {
        let segments = vec![speech(0, 2.5, 4.0)];
        let labels = vec![Some(3)];
        let timeline = derive_target_timeline(&segments, &labels, 6.0);
        assert_eq!(timeline, vec![TimelineSegment::new(Some(3), 0.0, 6.0)]);
    }

    #[test]
    fn test_derive_empty_input() {
        let timeline = derive_target_timeline(&[], &[], 10.0);
        assert!(timeline.is_empty());
    }
}
