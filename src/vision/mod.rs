//! Plate Text Recovery Pipeline
//!
//! Turns noisy per-character detections over a plate crop into a single
//! best string. Two strategies compete: character segmentation with
//! per-character recognition fusion, and whole-region OCR arbitrated by
//! the plate-format scorer. Every stage degrades to an emptier result
//! instead of failing; the worst case is an empty read, never an error.

pub mod assemble;
pub mod fusion;
pub mod locate;
pub mod regions;
pub mod rows;
pub mod scoring;
pub mod variants;
pub mod whole_plate;

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::capabilities::{CharacterClassifier, TextRecognizer};
use crate::charset;
use crate::config::EngineConfig;

pub use assemble::{join_rows, suppress_noise};
pub use fusion::{
    fuse_candidates, resolve_character, CandidateCharacter, ResolutionMethod, ResolvedCharacter,
};
pub use locate::{locate_plate, LocatedPlate};
pub use regions::{extract_regions, BoundingBox, CharacterRegion};
pub use rows::cluster_rows;
pub use scoring::{PlateCandidate, PlateScorer};
pub use variants::{generate_variants, Variant};
pub use whole_plate::read_whole_plate;

/// One resolved character in the final read, for auditing.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterRead {
    pub character: char,
    pub confidence: f32,
    /// Region box in plate-image coordinates.
    pub bounds: BoundingBox,
    pub method: ResolutionMethod,
}

/// Final plate read: best text, its alphanumeric-only form, and the
/// per-character audit trail from the segmentation strategy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlateReadResult {
    /// Arbitrated plate text. Empty means "no read".
    pub text: String,
    /// Alphanumeric-only form for downstream matching.
    pub normalized: String,
    pub characters: Vec<CharacterRead>,
}

/// The plate text recovery engine.
///
/// Owns no models: the character classifier and OCR engine are injected
/// capabilities, assumed to serialize access to any shared instance
/// themselves. One `read_plate` call is one independent unit of work.
pub struct PlateReader<C, R> {
    classifier: C,
    recognizer: R,
    scorer: PlateScorer,
    config: EngineConfig,
}

impl<C, R> PlateReader<C, R>
where
    C: CharacterClassifier,
    R: TextRecognizer,
{
    /// Create a reader with default configuration.
    pub fn new(classifier: C, recognizer: R) -> Self {
        Self::with_config(classifier, recognizer, EngineConfig::default())
    }

    /// Create a reader with custom configuration.
    pub fn with_config(classifier: C, recognizer: R, config: EngineConfig) -> Self {
        Self {
            classifier,
            recognizer,
            scorer: PlateScorer::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recover the plate text from a cropped plate image.
    ///
    /// Never fails: collaborator errors shrink the candidate pool and an
    /// unreadable plate comes back as an empty string.
    pub fn read_plate(&self, plate: &DynamicImage) -> PlateReadResult {
        if plate.width() == 0 || plate.height() == 0 {
            return PlateReadResult::default();
        }

        let detections = match self.classifier.classify(plate) {
            Ok(detections) => detections,
            Err(err) => {
                warn!("character detection failed: {:#}", err);
                Vec::new()
            }
        };
        if detections.is_empty() {
            debug!("no character detections, returning empty read");
            return PlateReadResult::default();
        }

        // Strategy 1: segment characters, fuse each one.
        let regions = extract_regions(plate, &detections, &self.config.extraction);
        let rows = cluster_rows(regions, &self.config.rows);

        let mut characters = Vec::new();
        let mut row_strings = Vec::new();
        for row in &rows {
            let mut row_text = String::new();
            for region in row {
                let resolved = resolve_character(
                    region,
                    &self.classifier,
                    &self.recognizer,
                    &self.config.fusion,
                    &self.config.variants,
                );
                if let Some(resolved) = resolved {
                    row_text.push(resolved.character);
                    characters.push(CharacterRead {
                        character: resolved.character,
                        confidence: resolved.confidence,
                        bounds: region.bounds,
                        method: resolved.method,
                    });
                }
            }
            row_strings.push(row_text);
        }

        let segmented = join_rows(&row_strings);

        // Strategy 2 only runs when the segmentation read is not
        // plate-shaped: at least two usable characters in the loose
        // letters-then-digits layout.
        let plate_shaped = charset::normalize(&segmented).chars().count() >= 2
            && self.scorer.loose_matches(&segmented);

        let mut text = segmented;
        if !plate_shaped {
            debug!("segmentation read '{}' not plate-shaped, trying whole-region ocr", text);
            let whole = read_whole_plate(
                plate,
                &self.recognizer,
                &self.scorer,
                &self.config.whole_plate,
            );
            // A failed fallback never erases a partial read.
            if !whole.is_empty() {
                text = whole;
            }
        }

        let text = suppress_noise(&text, self.config.assembly.noise_keep_ratio);
        let normalized = charset::normalize(&text);

        debug!("plate read '{}' ({} characters resolved)", text, characters.len());

        PlateReadResult { text, normalized, characters }
    }
}
