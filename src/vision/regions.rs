//! Character region extraction
//!
//! Sanitizes raw detections into padded, bounds-checked crops ready for
//! per-character recognition. Degenerate boxes never survive this stage.

use image::DynamicImage;
use serde::Serialize;
use tracing::debug;

use crate::capabilities::Detection;
use crate::config::ExtractionConfig;

use super::variants::equalize_tiles;

/// Regions this small carry no readable glyph.
const MIN_REGION_SIDE_PX: u32 = 5;

/// Integer corner box clamped to image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// One sanitized character crop plus its originating detection.
#[derive(Debug, Clone)]
pub struct CharacterRegion {
    /// Padded box in plate-image coordinates.
    pub bounds: BoundingBox,
    /// Center of the unpadded detection box.
    pub center_x: f32,
    pub center_y: f32,
    /// Cropped, contrast-enhanced sub-image.
    pub image: DynamicImage,
    /// Originating class label, kept as a fallback hint.
    pub hint_label: String,
    /// Originating detection confidence.
    pub hint_confidence: f32,
}

/// Extract character regions from detections over a plate crop.
///
/// Detections below `min_confidence` are dropped (equality is kept);
/// boxes are clamped to the image, rejected when either side is 5 px or
/// less, then padded by `max(padding_min_px, padding_ratio * side)` per
/// axis without leaving the image.
pub fn extract_regions(
    plate: &DynamicImage,
    detections: &[Detection],
    config: &ExtractionConfig,
) -> Vec<CharacterRegion> {
    let (img_w, img_h) = (plate.width(), plate.height());
    if img_w == 0 || img_h == 0 {
        return Vec::new();
    }

    let mut regions = Vec::new();

    for det in detections {
        if det.confidence < config.min_confidence {
            continue;
        }

        let Some(bounds) = sanitize_box(det, img_w, img_h) else {
            continue;
        };

        let pad_x = padding(bounds.width(), config);
        let pad_y = padding(bounds.height(), config);
        let padded = BoundingBox {
            x1: bounds.x1.saturating_sub(pad_x),
            y1: bounds.y1.saturating_sub(pad_y),
            x2: (bounds.x2 + pad_x).min(img_w),
            y2: (bounds.y2 + pad_y).min(img_h),
        };

        let crop = plate.crop_imm(padded.x1, padded.y1, padded.width(), padded.height());
        let enhanced = enhance(&crop);

        regions.push(CharacterRegion {
            bounds: padded,
            center_x: (bounds.x1 + bounds.x2) as f32 / 2.0,
            center_y: (bounds.y1 + bounds.y2) as f32 / 2.0,
            image: enhanced,
            hint_label: det.label.clone(),
            hint_confidence: det.confidence,
        });
    }

    debug!("extracted {} regions from {} detections", regions.len(), detections.len());

    regions
}

/// Resolve a detection to a clamped corner box; `None` for degenerate
/// or too-small boxes.
fn sanitize_box(det: &Detection, img_w: u32, img_h: u32) -> Option<BoundingBox> {
    let (x1, y1, x2, y2) = det.geometry.corners();

    let x1 = (x1.round().max(0.0) as u32).min(img_w.saturating_sub(1));
    let y1 = (y1.round().max(0.0) as u32).min(img_h.saturating_sub(1));
    let x2 = (x2.round().max(0.0) as u32).min(img_w);
    let y2 = (y2.round().max(0.0) as u32).min(img_h);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    if x2 - x1 <= MIN_REGION_SIDE_PX || y2 - y1 <= MIN_REGION_SIDE_PX {
        return None;
    }

    Some(BoundingBox { x1, y1, x2, y2 })
}

fn padding(side: u32, config: &ExtractionConfig) -> u32 {
    ((side as f32 * config.padding_ratio).round() as u32).max(config.padding_min_px)
}

/// Localized contrast enhancement applied to each crop.
fn enhance(crop: &DynamicImage) -> DynamicImage {
    if crop.width() == 0 || crop.height() == 0 {
        return crop.clone();
    }
    DynamicImage::ImageLuma8(equalize_tiles(&crop.to_luma8(), 4, 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Geometry;
    use image::GrayImage;

    fn plate(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, image::Luma([128])))
    }

    fn corner_detection(label: &str, conf: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: conf,
            geometry: Geometry::Corners { x1, y1, x2, y2 },
        }
    }

    #[test]
    fn test_small_regions_rejected() {
        let img = plate(100, 60);
        let config = ExtractionConfig::default();

        // 5px wide: rejected. 6px wide: kept.
        let dets = vec![
            corner_detection("ก", 0.9, 10.0, 10.0, 15.0, 40.0),
            corner_detection("ข", 0.9, 30.0, 10.0, 36.0, 40.0),
        ];
        let regions = extract_regions(&img, &dets, &config);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].hint_label, "ข");
    }

    #[test]
    fn test_confidence_threshold_is_inclusive() {
        let img = plate(100, 60);
        let config = ExtractionConfig::default();

        let dets = vec![
            corner_detection("1", 0.3, 10.0, 10.0, 25.0, 40.0),
            corner_detection("2", 0.29, 40.0, 10.0, 55.0, 40.0),
        ];
        let regions = extract_regions(&img, &dets, &config);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].hint_label, "1");
    }

    #[test]
    fn test_center_form_converted() {
        let img = plate(100, 60);
        let det = Detection {
            label: "3".to_string(),
            confidence: 0.8,
            geometry: Geometry::Center { x: 50.0, y: 30.0, width: 20.0, height: 30.0 },
        };
        let regions = extract_regions(&img, &[det], &ExtractionConfig::default());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].center_x, 50.0);
        assert_eq!(regions[0].center_y, 30.0);
    }

    #[test]
    fn test_padding_is_applied_and_clamped() {
        let img = plate(100, 60);
        let config = ExtractionConfig::default();

        // Box touching the top-left corner; padding cannot go negative.
        let det = corner_detection("ก", 0.9, 0.0, 0.0, 30.0, 30.0);
        let regions = extract_regions(&img, &[det], &config);
        assert_eq!(regions.len(), 1);

        let b = regions[0].bounds;
        assert_eq!((b.x1, b.y1), (0, 0));
        // 10% of 30 = 3 px padding on the far sides.
        assert_eq!((b.x2, b.y2), (33, 33));
        assert_eq!(regions[0].image.width(), b.width());
        assert_eq!(regions[0].image.height(), b.height());
    }

    #[test]
    fn test_padding_floor() {
        let config = ExtractionConfig::default();
        // 10% of 20 = 2, below the 3 px floor.
        assert_eq!(padding(20, &config), 3);
        assert_eq!(padding(80, &config), 8);
    }

    #[test]
    fn test_out_of_bounds_box_clamped() {
        let img = plate(50, 40);
        let det = corner_detection("9", 0.9, 30.0, 20.0, 90.0, 70.0);
        let regions = extract_regions(&img, &[det], &ExtractionConfig::default());
        assert_eq!(regions.len(), 1);
        let b = regions[0].bounds;
        assert!(b.x2 <= 50 && b.y2 <= 40);
    }

    #[test]
    fn test_zero_area_plate_yields_nothing() {
        let img = plate(0, 0);
        let det = corner_detection("ก", 0.9, 0.0, 0.0, 20.0, 20.0);
        assert!(extract_regions(&img, &[det], &ExtractionConfig::default()).is_empty());
    }

    #[test]
    fn test_hint_carried_through() {
        let img = plate(100, 60);
        let det = corner_detection("กร", 0.77, 10.0, 10.0, 30.0, 40.0);
        let regions = extract_regions(&img, &[det], &ExtractionConfig::default());
        assert_eq!(regions[0].hint_label, "กร");
        assert!((regions[0].hint_confidence - 0.77).abs() < 1e-6);
    }
}
