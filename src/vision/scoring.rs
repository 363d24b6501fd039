//! Plate-format scoring
//!
//! Ranks whole-string candidates against the plate layouts seen in the
//! field: a two-letter category code with a 3-4 digit serial, the newer
//! digit-prefixed form, and a loose letters-then-digits shape for
//! partial reads. Noise characters cost more than a kept character
//! earns, so a noisy long read never outranks a clean short one.

use regex::Regex;

use crate::charset;

/// One whole-string hypothesis with its format score.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    pub text: String,
    pub score: i32,
}

/// Scorer for plate-shaped strings.
pub struct PlateScorer {
    two_letter_serial: Regex,
    digit_prefix_serial: Regex,
    loose: Regex,
}

impl PlateScorer {
    pub fn new() -> Self {
        Self {
            two_letter_serial: Regex::new(r"^([ก-ฮ]{2})\s*([0-9]{3,4})$").expect("valid pattern"),
            digit_prefix_serial: Regex::new(r"^[0-9]([ก-ฮ]{2})\s*([0-9]{4,5})$")
                .expect("valid pattern"),
            loose: Regex::new(r"([ก-ฮ]{1,2})\s*([0-9]+)").expect("valid pattern"),
        }
    }

    /// Score a raw candidate string. Higher is better; never negative.
    pub fn score(&self, text: &str) -> i32 {
        let stripped: String = text.chars().filter(|&c| !charset::is_separator(c)).collect();
        let stripped = stripped.trim();

        if let Some(caps) = self.two_letter_serial.captures(stripped) {
            let digits = caps[2].chars().count() as i32;
            return 100 + digits * 10;
        }

        if let Some(caps) = self.digit_prefix_serial.captures(stripped) {
            let digits = caps[2].chars().count() as i32;
            return 95 + digits * 8;
        }

        let mut score = 0i32;
        if let Some(caps) = self.loose.captures(stripped) {
            let letters = caps[1].chars().count() as i32;
            let digits = caps[2].chars().count() as i32;
            score += 50 + digits * 5 + letters * 3;
        }

        let kept = text.chars().filter(|&c| charset::is_allowed(c)).count() as i32;
        let noise = text.chars().filter(|&c| !charset::is_allowed(c)).count() as i32;
        score += kept;
        score -= noise * 5;

        score.max(0)
    }

    /// True when the string contains the loose letters-then-digits shape.
    pub fn loose_matches(&self, text: &str) -> bool {
        let stripped: String = text.chars().filter(|&c| !charset::is_separator(c)).collect();
        self.loose.is_match(stripped.trim())
    }

    /// Pick the best-scoring candidate; the first seen wins ties.
    pub fn best<'a, I>(&self, candidates: I) -> Option<PlateCandidate>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<PlateCandidate> = None;
        for text in candidates {
            let score = self.score(text);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(PlateCandidate { text: text.to_string(), score });
            }
        }
        best
    }
}

impl Default for PlateScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scores_zero() {
        let scorer = PlateScorer::new();
        assert_eq!(scorer.score(""), 0);
    }

    #[test]
    fn test_clean_plate_beats_noisy_partial() {
        let scorer = PlateScorer::new();
        assert!(scorer.score("กร1234") > scorer.score("ก1234x"));
    }

    #[test]
    fn test_two_letter_band_beats_digit_prefix_band() {
        let scorer = PlateScorer::new();
        // 100 + 4*10 vs 95 + 4*8
        assert_eq!(scorer.score("กข1234"), 140);
        assert_eq!(scorer.score("1กข1234"), 127);
    }

    #[test]
    fn test_separators_ignored_for_pattern_match() {
        let scorer = PlateScorer::new();
        assert_eq!(scorer.score("กข-1234"), scorer.score("กข1234"));
        assert_eq!(scorer.score("กข 1234"), 140);
    }

    #[test]
    fn test_noise_costs_more_than_kept_chars_earn() {
        let scorer = PlateScorer::new();
        // Same loose shape; three Latin noise chars drop it well below.
        assert!(scorer.score("กข123") > scorer.score("กข123xxz"));
    }

    #[test]
    fn test_never_negative() {
        let scorer = PlateScorer::new();
        assert_eq!(scorer.score("xyz!!"), 0);
    }

    #[test]
    fn test_loose_match() {
        let scorer = PlateScorer::new();
        assert!(scorer.loose_matches("ก 123"));
        assert!(scorer.loose_matches("อะไรก็ได้ กข 45"));
        assert!(!scorer.loose_matches("1234"));
        assert!(!scorer.loose_matches(""));
    }

    #[test]
    fn test_best_prefers_higher_score_and_first_tie() {
        let scorer = PlateScorer::new();
        let best = scorer
            .best(["ก1234x", "กร1234", "กข1234"])
            .unwrap();
        // Both full plates score 140; the first seen wins.
        assert_eq!(best.text, "กร1234");
        assert_eq!(best.score, 140);
    }
}
