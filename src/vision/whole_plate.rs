//! Whole-region OCR strategy
//!
//! The competing read path: instead of segmenting characters, run the
//! generic OCR engine over the full plate crop under several renderings
//! and page-segmentation assumptions, and let the plate-format scorer
//! arbitrate. Used when character segmentation produces nothing
//! plate-shaped.

use image::DynamicImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use tracing::{debug, warn};

use crate::capabilities::{OcrMode, TextRecognizer};
use crate::charset;
use crate::config::WholePlateConfig;

use super::scoring::PlateScorer;
use super::variants::upscale;

/// OCR the whole plate crop and return the best-scoring string.
///
/// Empty string when the crop is degenerate or every call fails.
pub fn read_whole_plate(
    plate: &DynamicImage,
    recognizer: &dyn TextRecognizer,
    scorer: &PlateScorer,
    config: &WholePlateConfig,
) -> String {
    if plate.width() == 0 || plate.height() == 0 {
        return String::new();
    }

    let upscaled = upscale(plate, config.target_height, config.min_scale);
    let gray = upscaled.to_luma8();
    let level = otsu_level(&gray);

    let mut inverted = upscaled.clone();
    inverted.invert();

    let renderings = [
        ("upscaled", upscaled.clone()),
        ("grayscale", DynamicImage::ImageLuma8(gray.clone())),
        (
            "otsu",
            DynamicImage::ImageLuma8(threshold(&gray, level, ThresholdType::Binary)),
        ),
        ("inverted", inverted),
    ];
    let modes = [OcrMode::SingleLine, OcrMode::Block];

    let mut candidates = Vec::new();
    for (name, image) in &renderings {
        for &mode in &modes {
            match recognizer.recognize(image, mode) {
                Ok(text) => candidates.push(charset::clean_text(&text)),
                Err(err) => {
                    warn!("whole-plate ocr failed on '{}' ({:?}): {:#}", name, mode, err);
                }
            }
        }
    }

    let best = scorer
        .best(candidates.iter().map(String::as_str))
        .map(|c| {
            debug!("whole-plate winner '{}' (score {})", c.text, c.score);
            c.text
        })
        .unwrap_or_default();

    best
}
