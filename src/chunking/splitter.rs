//! Separator-aware text splitter.
//!
//! Cuts text at the most significant separator available inside each window,
//! falling back to a hard character cut, and carries a fixed overlap from the
//! tail of each chunk into the next.

use super::{BudgetSpec, Chunk};
use crate::error::Result;
use tracing::debug;

/// Separator tiers, from the most to the least semantically significant.
///
/// Separators in the same tier are equivalent; the latest match in the window wins.
pub const SEPARATOR_TIERS: &[&[&str]] = &[
    &["\n\n"],
    &["\n"],
    &["\t"],
    &[". ", "! ", "? "],
    &["."],
];

/// Split `text` into chunks that fit `budget`.
pub fn split(text: &str, budget: BudgetSpec) -> Result<Vec<Chunk>> {
    Ok(Splitter::new(budget)?.split(text))
}

/// Splits text into an ordered sequence of overlapping chunks.
#[derive(Debug, Clone)]
pub struct Splitter {
    budget: BudgetSpec,
}

impl Splitter {
    /// Create a splitter for the given budget.
    pub fn new(budget: BudgetSpec) -> Result<Self> {
        budget.validate()?;
        Ok(Self { budget })
    }

    pub fn budget(&self) -> BudgetSpec {
        self.budget
    }

    /// Split a text body into chunks.
    ///
    /// Consecutive chunks share exactly `budget.overlap` characters, and no chunk is
    /// longer than `budget.max_size` characters.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char position, plus the end of the text.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        let BudgetSpec { max_size, overlap } = self.budget;

        if total <= max_size {
            return vec![Chunk::new(0, text.to_string())];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let limit = (start + max_size).min(total);
            let end = if limit == total {
                total
            } else {
                self.find_break(text, &offsets, start + overlap, limit)
                    .unwrap_or(limit)
            };

            chunks.push(Chunk::new(
                chunks.len(),
                text[offsets[start]..offsets[end]].to_string(),
            ));

            if end == total {
                break;
            }
            start = end - overlap;
        }

        debug!(
            "Split {} chars into {} chunks (max_size {}, overlap {})",
            total,
            chunks.len(),
            max_size,
            overlap
        );

        chunks
    }

    /// Find the char position just after the best separator in `(floor, limit]`.
    fn find_break(&self, text: &str, offsets: &[usize], floor: usize, limit: usize) -> Option<usize> {
        let window_start = offsets[floor];
        let window = &text[window_start..offsets[limit]];

        for tier in SEPARATOR_TIERS {
            let best = tier
                .iter()
                .filter_map(|sep| window.rfind(*sep).map(|pos| pos + sep.len()))
                .max();

            if let Some(byte_end) = best {
                if let Ok(pos) = offsets.binary_search(&(window_start + byte_end)) {
                    if pos > floor {
                        return Some(pos);
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::char_len;
    use crate::error::PrecisError;

    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.source_text);
            } else {
                out.extend(chunk.source_text.chars().skip(overlap));
            }
        }
        out
    }

    fn head(text: &str, n: usize) -> String {
        text.chars().take(n).collect()
    }

    fn tail(text: &str, n: usize) -> String {
        let len = char_len(text);
        text.chars().skip(len - n).collect()
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for p in 0..12 {
            text.push_str(&format!("Paragraphe {} — une idée développée ici. ", p));
            for s in 0..6 {
                text.push_str(&format!("Sentence {} of paragraph {} keeps going! ", s, p));
                if s % 3 == 2 {
                    text.push('\n');
                }
            }
            text.push_str("Notes:\tfin 🎧.\n\n");
        }
        text
    }

    #[test]
    fn test_scenario_long_text_without_separators() {
        let text = "abcdefghij".repeat(1000);
        let budget = BudgetSpec::with_overlap(3000, 750).unwrap();
        let chunks = split(&text, budget).unwrap();

        // 3000 + 4 * 2250 >= 10000 > 3000 + 3 * 2250
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.len() <= 3000));
        assert_eq!(head(&chunks[1].source_text, 750), tail(&chunks[0].source_text, 750));
        assert_eq!(reconstruct(&chunks, 750), text);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "x".repeat(500);
        let budget = BudgetSpec::with_overlap(3000, 750).unwrap();
        let chunks = split(&text, budget).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_text, text);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_coverage_bound_and_overlap() {
        let text = sample_text();
        for (max_size, overlap) in [(120, 30), (200, 0), (333, 80), (1000, 250)] {
            let budget = BudgetSpec::with_overlap(max_size, overlap).unwrap();
            let chunks = split(&text, budget).unwrap();

            assert!(chunks.len() > 1);
            assert_eq!(reconstruct(&chunks, overlap), text);
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.index, i);
                assert!(chunk.len() <= max_size);
            }
            for pair in chunks.windows(2) {
                assert_eq!(
                    head(&pair[1].source_text, overlap),
                    tail(&pair[0].source_text, overlap)
                );
            }
        }
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let text = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let budget = BudgetSpec::with_overlap(100, 10).unwrap();
        let chunks = split(&text, budget).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].source_text.ends_with("\n\n"));
        assert_eq!(reconstruct(&chunks, 10), text);
    }

    #[test]
    fn test_sentence_break_before_hard_cut() {
        let text = format!("{}. {}", "a".repeat(70), "b".repeat(70));
        let budget = BudgetSpec::with_overlap(100, 5).unwrap();
        let chunks = split(&text, budget).unwrap();

        assert!(chunks[0].source_text.ends_with(". "));
    }

    #[test]
    fn test_deterministic() {
        let text = sample_text();
        let budget = BudgetSpec::with_overlap(150, 40).unwrap();
        assert_eq!(split(&text, budget).unwrap(), split(&text, budget).unwrap());
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let budget = BudgetSpec::new(100).unwrap();
        assert!(split("", budget).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_budget_is_config_error() {
        let bad = BudgetSpec {
            max_size: 10,
            overlap: 10,
        };
        assert!(matches!(split("hello", bad), Err(PrecisError::Config(_))));

        let zero = BudgetSpec {
            max_size: 0,
            overlap: 0,
        };
        assert!(matches!(Splitter::new(zero), Err(PrecisError::Config(_))));
    }
}
