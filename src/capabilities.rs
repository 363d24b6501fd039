//! Injected recognition capabilities
//!
//! The engine never owns a model. The detector, the character classifier
//! and the generic OCR engine are shared external instances injected
//! behind these traits; every call is fallible and a failure is treated
//! by the pipeline as "no candidate", never as a fatal error.

use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Bounding geometry of a detection, in the two upstream wire forms.
///
/// Detector payloads carry either corner coordinates or a center plus
/// size; when a payload carries both, the corner form wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    /// Corner form: top-left and bottom-right.
    Corners { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// Center form: box center plus width and height.
    Center { x: f32, y: f32, width: f32, height: f32 },
}

impl Geometry {
    /// Resolve to corner form `(x1, y1, x2, y2)`.
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        match *self {
            Geometry::Corners { x1, y1, x2, y2 } => {
                (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
            }
            Geometry::Center { x, y, width, height } => (
                x - width / 2.0,
                y - height / 2.0,
                x + width / 2.0,
                y + height / 2.0,
            ),
        }
    }

    /// Box center `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        let (x1, y1, x2, y2) = self.corners();
        ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }
}

/// One raw detection from a detector or classifier model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Class label. Character models emit the glyph itself (possibly a
    /// multi-character class such as "กร").
    #[serde(alias = "class", alias = "name")]
    pub label: String,
    /// Model confidence in [0, 1].
    #[serde(alias = "conf")]
    pub confidence: f32,
    /// Bounding geometry in image coordinates.
    #[serde(flatten)]
    pub geometry: Geometry,
}

/// Character-level detector/classifier over a plate crop.
///
/// Invoked once per plate to segment characters, and re-invoked on each
/// preprocessed rendering of a single-character crop during fusion.
pub trait CharacterClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

/// Plate-region detector over a full camera frame.
pub trait PlateDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

/// Page-segmentation assumption handed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Treat the image as exactly one glyph.
    SingleCharacter,
    /// Treat the image as one text line.
    SingleLine,
    /// Treat the image as a uniform block of text.
    Block,
}

/// Generic OCR engine used as the fallback recognition source.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage, mode: OcrMode) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corner_payload() {
        let det: Detection = serde_json::from_str(
            r#"{"class": "ก", "confidence": 0.82, "x1": 4.0, "y1": 6.0, "x2": 20.0, "y2": 30.0}"#,
        )
        .unwrap();
        assert_eq!(det.label, "ก");
        assert_eq!(det.geometry.corners(), (4.0, 6.0, 20.0, 30.0));
    }

    #[test]
    fn test_parse_center_payload() {
        let det: Detection = serde_json::from_str(
            r#"{"name": "7", "conf": 0.5, "x": 12.0, "y": 18.0, "width": 16.0, "height": 24.0}"#,
        )
        .unwrap();
        assert_eq!(det.label, "7");
        assert_eq!(det.geometry.corners(), (4.0, 6.0, 20.0, 30.0));
        assert_eq!(det.geometry.center(), (12.0, 18.0));
    }

    #[test]
    fn test_corner_form_wins_when_both_present() {
        // Roboflow-style payloads carry both key sets; corners are exact.
        let det: Detection = serde_json::from_str(
            r#"{"class": "2", "confidence": 0.9,
                "x": 12.0, "y": 18.0, "width": 16.0, "height": 24.0,
                "x1": 4.0, "y1": 6.0, "x2": 20.0, "y2": 30.0}"#,
        )
        .unwrap();
        assert!(matches!(det.geometry, Geometry::Corners { .. }));
    }

    #[test]
    fn test_swapped_corners_are_reordered() {
        let g = Geometry::Corners { x1: 20.0, y1: 30.0, x2: 4.0, y2: 6.0 };
        assert_eq!(g.corners(), (4.0, 6.0, 20.0, 30.0));
    }
}
