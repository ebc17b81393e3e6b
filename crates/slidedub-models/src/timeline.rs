//! Slide timeline types: per-sample matches and grouped segments.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when validating a slide timeline.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("segment {index} is empty or inverted ({start:.3}s >= {end:.3}s)")]
    EmptySegment { index: usize, start: f64, end: f64 },

    #[error("segment {index} starts at {start:.3}s but previous segment ends at {prev_end:.3}s")]
    Gap {
        index: usize,
        start: f64,
        prev_end: f64,
    },

    #[error("last segment ends at {end:.3}s but timeline duration is {duration:.3}s")]
    ShortCoverage { end: f64, duration: f64 },
}

/// Best-match result for one uniformly-sampled frame.
///
/// `label = None` means no reference slide scored above the similarity
/// threshold (black frame or transition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMatch {
    /// Index of the sample on the uniform grid (sample 0 = time 0).
    pub sample_index: usize,
    /// Matched slide label, or `None` for black/transition.
    pub label: Option<u32>,
    /// Best similarity score in [0, 1].
    pub score: f64,
}

impl SampleMatch {
    pub fn new(sample_index: usize, label: Option<u32>, score: f64) -> Self {
        Self {
            sample_index,
            label,
            score,
        }
    }
}

/// A contiguous run of one slide (or black) on a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    /// Slide label, or `None` for black/transition.
    pub label: Option<u32>,
    /// Start time in seconds (inclusive).
    pub start: f64,
    /// End time in seconds (exclusive).
    pub end: f64,
}

impl TimelineSegment {
    pub fn new(label: Option<u32>, start: f64, end: f64) -> Self {
        Self { label, start, end }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` falls inside this segment's half-open `[start, end)` range.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// A detected slide timeline, persisted as `timing.json` in the job
/// workspace so the detection stage is resumable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingDocument {
    /// Ordered, contiguous segments covering the full timeline.
    pub segments: Vec<TimelineSegment>,
    /// Total timeline duration in seconds.
    pub duration: f64,
    /// Number of distinct slides seen (black runs excluded).
    pub slide_count: usize,
}

impl TimingDocument {
    /// Build a document from segments, deriving the distinct slide count.
    pub fn new(segments: Vec<TimelineSegment>, duration: f64) -> Self {
        let mut labels: Vec<u32> = segments.iter().filter_map(|s| s.label).collect();
        labels.sort_unstable();
        labels.dedup();
        Self {
            segments,
            duration,
            slide_count: labels.len(),
        }
    }

    /// Validate the contiguity invariant: ordered, non-overlapping,
    /// gap-free segments with the final end equal to the total duration.
    pub fn validate(&self) -> Result<(), TimelineError> {
        validate_segments(&self.segments, self.duration)
    }
}

/// Validate that `segments` are contiguous, ordered, non-empty, and cover
/// `[0, duration]` exactly.
pub fn validate_segments(segments: &[TimelineSegment], duration: f64) -> Result<(), TimelineError> {
    const EPS: f64 = 1e-6;

    let mut prev_end = 0.0;
    for (index, seg) in segments.iter().enumerate() {
        if seg.end - seg.start <= EPS {
            return Err(TimelineError::EmptySegment {
                index,
                start: seg.start,
                end: seg.end,
            });
        }
        if (seg.start - prev_end).abs() > EPS {
            return Err(TimelineError::Gap {
                index,
                start: seg.start,
                prev_end,
            });
        }
        prev_end = seg.end;
    }

    if !segments.is_empty() && (prev_end - duration).abs() > EPS {
        return Err(TimelineError::ShortCoverage {
            end: prev_end,
            duration,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_contains_half_open() {
        let seg = TimelineSegment::new(Some(1), 2.0, 5.0);
        assert!(seg.contains(2.0));
        assert!(seg.contains(4.999));
        assert!(!seg.contains(5.0));
        assert!(!seg.contains(1.999));
    }

    #[test]
    fn test_timing_document_slide_count() {
        let doc = TimingDocument::new(
            vec![
                TimelineSegment::new(Some(1), 0.0, 3.0),
                TimelineSegment::new(None, 3.0, 4.0),
                TimelineSegment::new(Some(2), 4.0, 8.0),
                TimelineSegment::new(Some(1), 8.0, 10.0),
            ],
            10.0,
        );
        assert_eq!(doc.slide_count, 2);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_gap() {
        let segments = vec![
            TimelineSegment::new(Some(1), 0.0, 3.0),
            TimelineSegment::new(Some(2), 3.5, 10.0),
        ];
        assert!(matches!(
            validate_segments(&segments, 10.0),
            Err(TimelineError::Gap { index: 1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_short_coverage() {
        let segments = vec![TimelineSegment::new(Some(1), 0.0, 9.0)];
        assert!(matches!(
            validate_segments(&segments, 10.0),
            Err(TimelineError::ShortCoverage { .. })
        ));
    }

    #[test]
    fn test_timing_document_round_trips() {
        let doc = TimingDocument::new(vec![TimelineSegment::new(Some(3), 0.0, 12.5)], 12.5);
        let json = serde_json::to_string(&doc).unwrap();
        let back: TimingDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.segments, doc.segments);
        assert_eq!(back.slide_count, 1);
    }
}
