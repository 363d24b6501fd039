//! Plate-region selection
//!
//! Picks the most confident plate detection in a camera frame and crops
//! it with a little padding, producing the input for the recovery
//! pipeline.

use image::DynamicImage;
use tracing::{debug, warn};

use crate::capabilities::{Detection, PlateDetector};
use crate::config::LocateConfig;

use super::regions::BoundingBox;

/// A cropped plate region located in a larger frame.
#[derive(Debug, Clone)]
pub struct LocatedPlate {
    /// Cropped plate image, padding included.
    pub image: DynamicImage,
    /// Padded box in frame coordinates.
    pub bounds: BoundingBox,
    /// Detector confidence of the winning detection.
    pub confidence: f32,
}

/// Locate the best plate region in a frame.
///
/// `None` when the frame is degenerate, the detector fails or returns
/// nothing, or the winning box collapses after clamping.
pub fn locate_plate(
    frame: &DynamicImage,
    detector: &dyn PlateDetector,
    config: &LocateConfig,
) -> Option<LocatedPlate> {
    let (img_w, img_h) = (frame.width(), frame.height());
    if img_w == 0 || img_h == 0 {
        return None;
    }

    let detections = match detector.detect(frame) {
        Ok(detections) => detections,
        Err(err) => {
            warn!("plate detector failed: {:#}", err);
            return None;
        }
    };

    // First strict maximum wins, so repeated runs pick the same box.
    let mut best: Option<&Detection> = None;
    for det in &detections {
        if best.map_or(true, |b| det.confidence > b.confidence) {
            best = Some(det);
        }
    }
    let best = best?;

    let (x1, y1, x2, y2) = best.geometry.corners();
    let x1 = (x1.round().max(0.0) as u32).min(img_w.saturating_sub(1));
    let y1 = (y1.round().max(0.0) as u32).min(img_h.saturating_sub(1));
    let x2 = (x2.round().max(0.0) as u32).min(img_w);
    let y2 = (y2.round().max(0.0) as u32).min(img_h);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let pad = (config.pad_ratio * (x2 - x1).max(y2 - y1) as f32).round() as u32;
    let bounds = BoundingBox {
        x1: x1.saturating_sub(pad),
        y1: y1.saturating_sub(pad),
        x2: (x2 + pad).min(img_w),
        y2: (y2 + pad).min(img_h),
    };

    debug!(
        "located plate at ({}, {})-({}, {}) conf {:.2}",
        bounds.x1, bounds.y1, bounds.x2, bounds.y2, best.confidence
    );

    Some(LocatedPlate {
        image: frame.crop_imm(bounds.x1, bounds.y1, bounds.width(), bounds.height()),
        bounds,
        confidence: best.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Detection, Geometry};
    use anyhow::{bail, Result};
    use image::GrayImage;

    fn frame(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, image::Luma([90])))
    }

    fn detection(confidence: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            label: "plate".to_string(),
            confidence,
            geometry: Geometry::Corners { x1, y1, x2, y2 },
        }
    }

    struct FixedDetector(Vec<Detection>);
    impl PlateDetector for FixedDetector {
        fn detect(&self, _frame: &DynamicImage) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;
    impl PlateDetector for FailingDetector {
        fn detect(&self, _frame: &DynamicImage) -> Result<Vec<Detection>> {
            bail!("detector offline")
        }
    }

    #[test]
    fn test_highest_confidence_detection_wins() {
        let detector = FixedDetector(vec![
            detection(0.6, 10.0, 10.0, 50.0, 30.0),
            detection(0.9, 100.0, 40.0, 180.0, 80.0),
        ]);
        let located = locate_plate(&frame(300, 200), &detector, &LocateConfig::default()).unwrap();
        assert!((located.confidence - 0.9).abs() < 1e-6);
        // 5% of the 80px width = 4px padding.
        assert_eq!(located.bounds.x1, 96);
        assert_eq!(located.bounds.y1, 36);
        assert_eq!(located.bounds.x2, 184);
        assert_eq!(located.bounds.y2, 84);
        assert_eq!(located.image.width(), located.bounds.width());
    }

    #[test]
    fn test_padding_clamped_at_frame_edge() {
        let detector = FixedDetector(vec![detection(0.8, 0.0, 0.0, 60.0, 40.0)]);
        let located = locate_plate(&frame(100, 50), &detector, &LocateConfig::default()).unwrap();
        assert_eq!((located.bounds.x1, located.bounds.y1), (0, 0));
        assert_eq!(located.bounds.x2, 63);
        assert_eq!(located.bounds.y2, 43);
    }

    #[test]
    fn test_no_detections_is_none() {
        let detector = FixedDetector(vec![]);
        assert!(locate_plate(&frame(100, 50), &detector, &LocateConfig::default()).is_none());
    }

    #[test]
    fn test_detector_failure_is_none() {
        assert!(locate_plate(&frame(100, 50), &FailingDetector, &LocateConfig::default()).is_none());
    }

    #[test]
    fn test_degenerate_box_is_none() {
        let detector = FixedDetector(vec![detection(0.9, 40.0, 20.0, 40.0, 20.0)]);
        assert!(locate_plate(&frame(100, 50), &detector, &LocateConfig::default()).is_none());
    }

    #[test]
    fn test_zero_area_frame_is_none() {
        let detector = FixedDetector(vec![detection(0.9, 0.0, 0.0, 10.0, 10.0)]);
        assert!(locate_plate(&frame(0, 0), &detector, &LocateConfig::default()).is_none());
    }
}
