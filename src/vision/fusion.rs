//! Per-character recognition fusion
//!
//! Resolves one character crop into one character through a strict
//! priority cascade: re-classify the crop across all preprocessed
//! variants, fall back to the detection's own class label, then to
//! generic single-glyph OCR, and finally to the label as a last resort.
//! Each stage runs only when the previous one produced nothing usable;
//! a region that survives no stage contributes no character at all.

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::capabilities::{CharacterClassifier, OcrMode, TextRecognizer};
use crate::charset;
use crate::config::{FusionConfig, VariantConfig};

use super::regions::CharacterRegion;
use super::variants::generate_variants;

/// How a character was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Re-classification of the crop across image variants.
    DirectModel,
    /// The originating detection's class label.
    HintFallback,
    /// Generic single-character OCR.
    OcrFallback,
}

/// One classifier result on one image variant.
#[derive(Debug, Clone)]
pub struct CandidateCharacter {
    pub character: char,
    pub confidence: f32,
    /// Variant the candidate came from, e.g. "otsu".
    pub variant: String,
}

/// The character chosen for a region.
#[derive(Debug, Clone)]
pub struct ResolvedCharacter {
    pub character: char,
    pub confidence: f32,
    pub method: ResolutionMethod,
}

/// Run the full cascade for one region.
pub fn resolve_character(
    region: &CharacterRegion,
    classifier: &dyn CharacterClassifier,
    recognizer: &dyn TextRecognizer,
    fusion: &FusionConfig,
    variants: &VariantConfig,
) -> Option<ResolvedCharacter> {
    // Stage 1: direct re-classification across variants.
    let candidates = classify_across_variants(
        &region.image,
        classifier,
        fusion.classifier_min_confidence,
        variants,
    );
    if let Some((character, confidence)) = fuse_candidates(&candidates) {
        debug!(
            "resolved '{}' from {} candidates (score {:.2})",
            character,
            candidates.len(),
            confidence
        );
        return Some(ResolvedCharacter {
            character,
            confidence,
            method: ResolutionMethod::DirectModel,
        });
    }

    // Stage 2: confident hint from the originating detection.
    if region.hint_confidence >= fusion.hint_min_confidence {
        if let Some(character) = hint_character(&region.hint_label) {
            return Some(ResolvedCharacter {
                character,
                confidence: region.hint_confidence,
                method: ResolutionMethod::HintFallback,
            });
        }
    }

    // Stage 3: generic single-glyph OCR over the variants.
    if let Some(character) = ocr_fallback(&region.image, recognizer, variants) {
        return Some(ResolvedCharacter {
            character,
            confidence: region.hint_confidence,
            method: ResolutionMethod::OcrFallback,
        });
    }

    // Stage 4: a single-character hint is usable even below the
    // confidence bar when everything else came up empty.
    let trimmed = region.hint_label.trim();
    let mut chars = trimmed.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        if charset::is_allowed(only) {
            return Some(ResolvedCharacter {
                character: only,
                confidence: region.hint_confidence,
                method: ResolutionMethod::HintFallback,
            });
        }
    }

    None
}

/// Stage 1 candidate collection: classifier over every variant.
///
/// Classifier failures and off-alphabet labels are dropped silently;
/// they are noise, not errors.
pub fn classify_across_variants(
    image: &DynamicImage,
    classifier: &dyn CharacterClassifier,
    min_confidence: f32,
    config: &VariantConfig,
) -> Vec<CandidateCharacter> {
    let mut candidates = Vec::new();

    for variant in generate_variants(image, config) {
        let detections = match classifier.classify(&variant.image) {
            Ok(detections) => detections,
            Err(err) => {
                warn!("classifier failed on variant '{}': {:#}", variant.name, err);
                continue;
            }
        };

        for det in detections {
            if det.confidence <= min_confidence {
                continue;
            }
            let Some(first) = det.label.trim().chars().next() else {
                continue;
            };
            if !charset::is_allowed(first) {
                continue;
            }
            candidates.push(CandidateCharacter {
                character: first,
                confidence: det.confidence.clamp(0.0, 1.0),
                variant: variant.name.clone(),
            });
        }
    }

    candidates
}

/// Fuse stage-1 candidates into one character.
///
/// Groups by character and scores each group as
/// `0.3 * mean + 0.7 * max`, favoring one strong hit over many weak
/// ones. Groups form in candidate order, and only a strictly better
/// score displaces the leader, so equal scores resolve to the character
/// seen first in variant-enumeration order.
pub fn fuse_candidates(candidates: &[CandidateCharacter]) -> Option<(char, f32)> {
    struct Group {
        character: char,
        sum: f32,
        count: u32,
        max: f32,
    }

    let mut groups: Vec<Group> = Vec::new();
    for candidate in candidates {
        match groups.iter_mut().find(|g| g.character == candidate.character) {
            Some(group) => {
                group.sum += candidate.confidence;
                group.count += 1;
                group.max = group.max.max(candidate.confidence);
            }
            None => groups.push(Group {
                character: candidate.character,
                sum: candidate.confidence,
                count: 1,
                max: candidate.confidence,
            }),
        }
    }

    let mut best: Option<(char, f32)> = None;
    for group in &groups {
        let mean = group.sum / group.count as f32;
        let score = 0.3 * mean + 0.7 * group.max;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((group.character, score));
        }
    }
    best
}

/// First allowed character of a trimmed hint label, if any.
fn hint_character(label: &str) -> Option<char> {
    let first = label.trim().chars().next()?;
    charset::is_allowed(first).then_some(first)
}

/// Stage 3: single-character OCR over the variants; the first call
/// whose cleaned, allowed-set-filtered output is non-empty wins.
fn ocr_fallback(
    image: &DynamicImage,
    recognizer: &dyn TextRecognizer,
    config: &VariantConfig,
) -> Option<char> {
    for variant in generate_variants(image, config) {
        let text = match recognizer.recognize(&variant.image, OcrMode::SingleCharacter) {
            Ok(text) => text,
            Err(err) => {
                warn!("ocr failed on variant '{}': {:#}", variant.name, err);
                continue;
            }
        };

        let filtered = charset::filter_allowed(&charset::clean_text(&text));
        if let Some(character) = filtered.chars().next() {
            debug!("ocr fallback read '{}' on variant '{}'", character, variant.name);
            return Some(character);
        }
    }
    None
}
