//! Allowed character set for Thai motorcycle plates
//!
//! Everything outside this alphabet is treated as recognition noise.
//! Covers Thai consonants, the vowel/tone marks that appear on province
//! lines, Arabic digits, and the separators OCR sometimes reads the
//! plate frame as.

/// Thai consonants ก-ฮ plus the vowel and tone marks seen on plates.
const THAI_BLOCK: &str =
    "กขฃคฅฆงจฉชซฌญฎฏฐฑฒณดตถทธนบปผฝพฟภมยรฤลฦวศษสหฬอฮะาิีึืุูเแโใไ์่้๊๋็ๅๆฯ";

/// Separators that show up when OCR picks up the plate frame or bolts.
const SEPARATORS: &str = "|/-";

/// Returns true if the character may appear in a plate read.
pub fn is_allowed(c: char) -> bool {
    c.is_ascii_digit() || c == ' ' || THAI_BLOCK.contains(c) || SEPARATORS.contains(c)
}

/// Returns true if the character counts as a separator, not plate content.
pub fn is_separator(c: char) -> bool {
    SEPARATORS.contains(c)
}

/// Drop every character outside the allowed set.
pub fn filter_allowed(text: &str) -> String {
    text.chars().filter(|&c| is_allowed(c)).collect()
}

/// First allowed character of the text, if any.
pub fn first_allowed(text: &str) -> Option<char> {
    text.chars().find(|&c| is_allowed(c))
}

/// Collapse newlines and repeated whitespace into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Alphanumeric-only form used for matching and cooldown keys.
///
/// Spaces, separators and combining marks are stripped so that
/// "กข 1234" and "กข-1234" compare equal.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| c.is_alphanumeric()).collect()
}
