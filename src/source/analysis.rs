//! Cheap text statistics used before running the pipeline.

use regex::Regex;
use std::sync::LazyLock;

/// Characters counted as punctuation.
const PUNCTUATION_MARKS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '-', '(', ')', '[', ']', '{', '}', '"', '\'', '…',
];

static REPEATED_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \u{00A0}]{2,}").expect("Invalid regex"));

/// Share of punctuation characters in `text`, as a percentage.
///
/// Punctuated prose sits well above 2%; raw speech transcripts are often near 0.
pub fn punctuation_percentage(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let marks = text.chars().filter(|c| PUNCTUATION_MARKS.contains(c)).count();
    marks as f64 / total as f64 * 100.0
}

/// Collapse runs of spaces into one.
pub fn collapse_spaces(text: &str) -> String {
    REPEATED_SPACES.replace_all(text, " ").into_owned()
}
