//! Plate text assembly
//!
//! Joins resolved rows into the final string and suppresses noise: when
//! too much of the assembled text falls outside the allowed alphabet,
//! the filtered form is the better read.

use tracing::debug;

use crate::charset;

/// Concatenated rows, top row first, one space between rows.
///
/// Empty rows vanish; repeated whitespace collapses.
pub fn join_rows(rows: &[String]) -> String {
    charset::clean_text(&rows.join(" "))
}

/// Prefer the allowed-set-only form when it keeps fewer than
/// `keep_ratio` of the original characters.
pub fn suppress_noise(text: &str, keep_ratio: f32) -> String {
    let filtered = charset::filter_allowed(text);
    let total = text.chars().count() as f32;
    let kept = filtered.chars().count() as f32;

    if kept < keep_ratio * total {
        debug!(
            "noise suppression kept {}/{} chars, using filtered text",
            kept as u32, total as u32
        );
        charset::clean_text(&filtered)
    } else {
        text.to_string()
    }
}
