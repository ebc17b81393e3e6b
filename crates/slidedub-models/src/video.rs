//! Video segment specification for rendered assembly units.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Specification for one fixed-length rendered video segment.
///
/// Consumed once by the rendering call that turns it into a clip; `image =
/// None` renders a solid black frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSegmentSpec {
    /// Still image to show, or `None` for black.
    pub image: Option<PathBuf>,
    /// Clip duration in seconds.
    pub duration: f64,
}

impl VideoSegmentSpec {
    pub fn new(image: Option<PathBuf>, duration: f64) -> Self {
        Self { image, duration }
    }

    /// A black segment of the given duration.
    pub fn black(duration: f64) -> Self {
        Self {
            image: None,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_spec() {
        let spec = VideoSegmentSpec::black(2.0);
        assert!(spec.image.is_none());
        assert!((spec.duration - 2.0).abs() < f64::EPSILON);
    }
}
