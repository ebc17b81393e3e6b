//! Frame-vs-slide similarity classification.
//!
//! Each sampled frame is scored against every reference slide with a
//! structural-similarity metric over downscaled grayscale rasters; the
//! best-scoring slide wins. Scores below the threshold report no slide at
//! all, so ambiguous transition frames become black runs instead of wrong
//! guesses.

use image::imageops::FilterType;
use image::GrayImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use slidedub_models::SampleMatch;

use crate::error::{EngineError, EngineResult};

/// SSIM stabilizer constants for 8-bit dynamic range.
const SSIM_C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const SSIM_C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// Window size for local SSIM statistics.
const SSIM_WINDOW: u32 = 8;

/// A reference slide image loaded for comparison.
///
/// Immutable once loaded; one set lives for one job run. `label = None` is
/// reserved for a black/transition reference, though in practice references
/// come from numbered slide exports.
#[derive(Debug, Clone)]
pub struct ReferenceSlide {
    pub label: Option<u32>,
    pub image: GrayImage,
}

impl ReferenceSlide {
    pub fn new(label: Option<u32>, image: GrayImage) -> Self {
        Self { label, image }
    }
}

/// Load reference slides from a directory of `slide_NN.png` exports,
/// converted to grayscale and downscaled to the comparison size.
pub fn load_reference_slides(
    dir: impl AsRef<Path>,
    width: u32,
    height: u32,
) -> EngineResult<Vec<ReferenceSlide>> {
    let dir = dir.as_ref();

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|_| EngineError::NoReferenceSlides(dir.to_path_buf()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    files.sort();

    let mut slides = Vec::new();
    for file in files {
        let Some(label) = parse_slide_label(&file) else {
            continue;
        };
        let image = load_gray_scaled(&file, width, height)?;
        slides.push(ReferenceSlide::new(Some(label), image));
    }

    if slides.is_empty() {
        return Err(EngineError::NoReferenceSlides(dir.to_path_buf()));
    }

    info!(
        slides = slides.len(),
        dir = %dir.display(),
        "Loaded reference slide images"
    );
    Ok(slides)
}

/// Parse the slide number out of a `slide_NN.png` filename.
fn parse_slide_label(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix("slide_")?;
    digits.parse().ok()
}

/// Load an image as grayscale, downscaled to the comparison size.
pub fn load_gray_scaled(path: &Path, width: u32, height: u32) -> EngineResult<GrayImage> {
    let img = image::open(path)?;
    Ok(image::imageops::resize(
        &img.to_luma8(),
        width,
        height,
        FilterType::Lanczos3,
    ))
}

/// Mean structural similarity between two equal-size grayscale images.
///
/// Computed over non-overlapping local windows with the standard C1/C2
/// stabilizers and averaged. Returns a value in [0, 1] for natural images;
/// mismatched dimensions score 0 and are reported once.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> f64 {
    if a.dimensions() != b.dimensions() {
        warn!(
            a = ?a.dimensions(),
            b = ?b.dimensions(),
            "SSIM input size mismatch, scoring 0"
        );
        return 0.0;
    }

    let (width, height) = a.dimensions();
    let mut total = 0.0;
    let mut windows = 0usize;

    let mut y = 0;
    while y < height {
        let wh = SSIM_WINDOW.min(height - y);
        let mut x = 0;
        while x < width {
            let ww = SSIM_WINDOW.min(width - x);
            total += window_ssim(a, b, x, y, ww, wh);
            windows += 1;
            x += SSIM_WINDOW;
        }
        y += SSIM_WINDOW;
    }

    if windows == 0 {
        0.0
    } else {
        total / windows as f64
    }
}

fn window_ssim(a: &GrayImage, b: &GrayImage, x0: u32, y0: u32, w: u32, h: u32) -> f64 {
    let n = (w * h) as f64;

    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            sum_a += a.get_pixel(x, y)[0] as f64;
            sum_b += b.get_pixel(x, y)[0] as f64;
        }
    }
    let mean_a = sum_a / n;
    let mean_b = sum_b / n;

    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut cov = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let da = a.get_pixel(x, y)[0] as f64 - mean_a;
            let db = b.get_pixel(x, y)[0] as f64 - mean_b;
            var_a += da * da;
            var_b += db * db;
            cov += da * db;
        }
    }
    var_a /= n;
    var_b /= n;
    cov /= n;

    ((2.0 * mean_a * mean_b + SSIM_C1) * (2.0 * cov + SSIM_C2))
        / ((mean_a * mean_a + mean_b * mean_b + SSIM_C1) * (var_a + var_b + SSIM_C2))
}

/// Scores sampled frames against a fixed set of reference slides.
pub struct FrameClassifier {
    slides: Vec<ReferenceSlide>,
    threshold: f64,
}

impl FrameClassifier {
    /// Create a classifier over a non-empty reference set.
    pub fn new(slides: Vec<ReferenceSlide>, threshold: f64) -> EngineResult<Self> {
        if slides.is_empty() {
            return Err(EngineError::config(
                "classifier needs at least one reference slide",
            ));
        }
        Ok(Self { slides, threshold })
    }

    /// Classify one sampled frame, returning the best match or `None` below
    /// the similarity threshold.
    pub fn classify(&self, sample_index: usize, frame: &GrayImage) -> SampleMatch {
        let mut best_label = None;
        let mut best_score = 0.0;

        for slide in &self.slides {
            let score = ssim(frame, &slide.image);
            if score > best_score {
                best_score = score;
                best_label = slide.label;
            }
        }

        if best_score < self.threshold {
            best_label = None;
        }

        SampleMatch::new(sample_index, best_label, best_score)
    }

    /// Classify a sequence of extracted frame files in sample order.
    pub fn classify_files(
        &self,
        frames: &[PathBuf],
        width: u32,
        height: u32,
    ) -> EngineResult<Vec<SampleMatch>> {
        let mut matches = Vec::with_capacity(frames.len());

        for (i, path) in frames.iter().enumerate() {
            let frame = load_gray_scaled(path, width, height)?;
            let m = self.classify(i, &frame);

            if (i + 1) % 30 == 0 || i + 1 == frames.len() {
                debug!(
                    sample = i,
                    label = ?m.label,
                    score = format!("{:.3}", m.score),
                    "Classified frame"
                );
            }
            matches.push(m);
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([value]))
    }

    fn gradient_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            image::Luma([((x * 7 + y * 13) % 256) as u8])
        })
    }

    #[test]
    fn test_ssim_identical_images() {
        let img = gradient_image(64, 64);
        let score = ssim(&img, &img);
        assert!((score - 1.0).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_ssim_distinct_images_score_low() {
        let a = flat_image(64, 64, 0);
        let b = flat_image(64, 64, 255);
        assert!(ssim(&a, &b) < 0.1);
    }

    #[test]
    fn test_ssim_size_mismatch_scores_zero() {
        let a = flat_image(64, 64, 128);
        let b = flat_image(32, 32, 128);
        assert_eq!(ssim(&a, &b), 0.0);
    }

    #[test]
    fn test_classifier_rejects_empty_reference_set() {
        assert!(FrameClassifier::new(Vec::new(), 0.40).is_err());
    }

    #[test]
    fn test_classifier_picks_argmax() {
        let slides = vec![
            ReferenceSlide::new(Some(1), flat_image(64, 64, 40)),
            ReferenceSlide::new(Some(2), gradient_image(64, 64)),
        ];
        let classifier = FrameClassifier::new(slides, 0.40).unwrap();

        let m = classifier.classify(0, &gradient_image(64, 64));
        assert_eq!(m.label, Some(2));
        assert!(m.score > 0.99);
    }

    #[test]
    fn test_classifier_below_threshold_reports_no_slide() {
        let slides = vec![ReferenceSlide::new(Some(1), gradient_image(64, 64))];
        let classifier = FrameClassifier::new(slides, 0.40).unwrap();

        // A flat black frame bears no structural resemblance to the gradient
        let m = classifier.classify(3, &flat_image(64, 64, 0));
        assert_eq!(m.label, None);
        assert_eq!(m.sample_index, 3);
    }

    #[test]
    fn test_parse_slide_label() {
        assert_eq!(parse_slide_label(Path::new("slide_01.png")), Some(1));
        assert_eq!(parse_slide_label(Path::new("slide_12.png")), Some(12));
        assert_eq!(parse_slide_label(Path::new("cover.png")), None);
    }
}
