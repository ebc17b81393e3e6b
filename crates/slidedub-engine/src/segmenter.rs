//! Timeline segmentation: debounce the per-sample match stream and group
//! it into contiguous slide segments.

use tracing::debug;

use slidedub_models::{SampleMatch, TimelineSegment};

/// Snap isolated single-sample label spikes to the neighboring consensus.
///
/// Only an interior sample whose label differs from both neighbors while
/// the neighbors agree with each other is rewritten. A 3-sample window is
/// enough to remove one-sample misclassifications; longer noise runs are
/// left alone so real short segments survive. Running this twice yields the
/// same result as running it once.
pub fn debounce(matches: &[SampleMatch]) -> Vec<SampleMatch> {
    let mut result: Vec<SampleMatch> = matches.to_vec();
    if result.len() < 3 {
        return result;
    }

    for i in 1..result.len() - 1 {
        let prev = matches[i - 1].label;
        let curr = matches[i].label;
        let next = matches[i + 1].label;

        if curr != prev && curr != next && prev == next {
            result[i].label = prev;
        }
    }

    result
}

/// Group consecutive samples with the same label into timeline segments.
///
/// Sample `i` sits at `i * sample_interval` seconds. The first segment
/// starts at 0 and the last segment is closed at `total_duration` rather
/// than the last sample's timestamp, so the timeline always covers the
/// whole media even when the final sample lands short of the true end.
///
/// An empty sample sequence yields an empty list; the caller treats that as
/// "no segments detected" and reports it upward.
pub fn group_segments(
    matches: &[SampleMatch],
    total_duration: f64,
    sample_interval: f64,
) -> Vec<TimelineSegment> {
    if matches.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current_label = matches[0].label;
    let mut current_start = 0.0;

    for m in &matches[1..] {
        if m.label != current_label {
            let timestamp = m.sample_index as f64 * sample_interval;
            segments.push(TimelineSegment::new(current_label, current_start, timestamp));
            current_label = m.label;
            current_start = timestamp;
        }
    }

    segments.push(TimelineSegment::new(
        current_label,
        current_start,
        total_duration,
    ));

    segments
}

/// Debounce and group in one step.
pub fn build_timeline(
    matches: &[SampleMatch],
    total_duration: f64,
    sample_interval: f64,
) -> Vec<TimelineSegment> {
    let cleaned = debounce(matches);
    let segments = group_segments(&cleaned, total_duration, sample_interval);
    debug!(
        samples = matches.len(),
        segments = segments.len(),
        "Built slide timeline"
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidedub_models::timeline::validate_segments;

    fn matches_from_labels(labels: &[Option<u32>]) -> Vec<SampleMatch> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| SampleMatch::new(i, *label, 0.8))
            .collect()
    }

    #[test]
    fn test_debounce_snaps_isolated_spike() {
        let input = matches_from_labels(&[Some(1), Some(2), Some(1)]);
        let out = debounce(&input);
        assert_eq!(out[1].label, Some(1));
    }

    #[test]
    fn test_debounce_keeps_real_boundaries() {
        let input = matches_from_labels(&[Some(1), Some(1), Some(2), Some(2)]);
        let out = debounce(&input);
        let labels: Vec<_> = out.iter().map(|m| m.label).collect();
        assert_eq!(labels, vec![Some(1), Some(1), Some(2), Some(2)]);
    }

    #[test]
    fn test_debounce_ignores_two_sample_runs() {
        // Two-sample noise runs are intentionally not smoothed
        let input = matches_from_labels(&[Some(1), Some(2), Some(2), Some(1)]);
        let out = debounce(&input);
        assert_eq!(out[1].label, Some(2));
        assert_eq!(out[2].label, Some(2));
    }

    #[test]
    fn test_debounce_handles_none_neighbors() {
        let input = matches_from_labels(&[None, Some(3), None]);
        let out = debounce(&input);
        assert_eq!(out[1].label, None);
    }

    #[test]
    fn test_debounce_is_idempotent() {
        let input = matches_from_labels(&[
            Some(1),
            Some(2),
            Some(1),
            Some(1),
            None,
            Some(1),
            Some(2),
            Some(2),
        ]);
        let once = debounce(&input);
        let twice = debounce(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_group_segments_empty_input() {
        assert!(group_segments(&[], 10.0, 1.0).is_empty());
    }

    #[test]
    fn test_group_segments_single_label() {
        let input = matches_from_labels(&[Some(1), Some(1), Some(1)]);
        let segments = group_segments(&input, 3.4, 1.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0], TimelineSegment::new(Some(1), 0.0, 3.4));
    }

    #[test]
    fn test_group_segments_last_end_forced_to_duration() {
        let input = matches_from_labels(&[Some(1), Some(1), Some(2)]);
        let segments = group_segments(&input, 3.7, 1.0);
        assert_eq!(segments.last().unwrap().end, 3.7);
    }

    #[test]
    fn test_known_sequence() {
        // [1,1,1,null,2,2,2,2,1,1] over 10 seconds
        let input = matches_from_labels(&[
            Some(1),
            Some(1),
            Some(1),
            None,
            Some(2),
            Some(2),
            Some(2),
            Some(2),
            Some(1),
            Some(1),
        ]);
        let segments = build_timeline(&input, 10.0, 1.0);
        assert_eq!(
            segments,
            vec![
                TimelineSegment::new(Some(1), 0.0, 3.0),
                TimelineSegment::new(None, 3.0, 4.0),
                TimelineSegment::new(Some(2), 4.0, 8.0),
                TimelineSegment::new(Some(1), 8.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_contiguity_invariant_over_random_sequences() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x51ede5eb);
        for _ in 0..200 {
            let len = rng.random_range(1..120usize);
            let labels: Vec<Option<u32>> = (0..len)
                .map(|_| {
                    if rng.random_bool(0.2) {
                        None
                    } else {
                        Some(rng.random_range(1..6))
                    }
                })
                .collect();
            let input = matches_from_labels(&labels);
            let duration = len as f64 + rng.random_range(-0.4..2.0);

            let segments = build_timeline(&input, duration, 1.0);
            assert!(!segments.is_empty());
            assert_eq!(segments[0].start, 0.0);
            validate_segments(&segments, duration).unwrap();
        }
    }
}
