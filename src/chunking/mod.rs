//! Text chunking for the map stage.
//!
//! Splits long texts into bounded, overlapping chunks that each fit the
//! transform capability's input budget.

mod splitter;

pub use splitter::{split, Splitter, SEPARATOR_TIERS};

use crate::error::{PrecisError, Result};
use serde::{Deserialize, Serialize};

/// Opaque per-call data returned by the transform capability (token usage, model, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A bounded slice of source text processed as one transform unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in its document sequence.
    pub index: usize,
    /// The slice of the original text.
    pub source_text: String,
    /// Transform result, absent until the chunk has been mapped.
    pub transformed_text: Option<String>,
    /// Data returned alongside the transform result.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    /// Create an untransformed chunk.
    pub fn new(index: usize, source_text: String) -> Self {
        Self {
            index,
            source_text,
            transformed_text: None,
            metadata: Metadata::new(),
        }
    }

    /// Transformed text, or an empty string when the chunk has not been mapped.
    pub fn transformed(&self) -> &str {
        self.transformed_text.as_deref().unwrap_or_default()
    }

    /// Length of the source text in characters.
    pub fn len(&self) -> usize {
        char_len(&self.source_text)
    }

    pub fn is_empty(&self) -> bool {
        self.source_text.is_empty()
    }
}

/// Size budget for chunks and combined output, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSpec {
    /// Maximum characters a chunk or combined output may occupy.
    pub max_size: usize,
    /// Characters shared between consecutive chunks.
    pub overlap: usize,
}

impl BudgetSpec {
    /// Budget with the default overlap of a quarter of `max_size`.
    pub fn new(max_size: usize) -> Result<Self> {
        Self::with_overlap(max_size, max_size / 4)
    }

    /// Budget with an explicit overlap.
    pub fn with_overlap(max_size: usize, overlap: usize) -> Result<Self> {
        let budget = Self { max_size, overlap };
        budget.validate()?;
        Ok(budget)
    }

    /// Derive a budget from the capability's input limit and the prompt overhead.
    ///
    /// The chunk size is whatever remains of `context_max_chars` once the rendered
    /// template (without the text) is accounted for.
    pub fn for_prompt(
        context_max_chars: usize,
        template_overhead: usize,
        overlap: Option<usize>,
    ) -> Result<Self> {
        let max_size = context_max_chars
            .checked_sub(template_overhead)
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                PrecisError::Config(format!(
                    "Prompt template ({} chars) leaves no room for text within the context limit ({} chars)",
                    template_overhead, context_max_chars
                ))
            })?;

        match overlap {
            Some(overlap) => Self::with_overlap(max_size, overlap),
            None => Self::new(max_size),
        }
    }

    /// Check `0 <= overlap < max_size` and `max_size > 0`.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(PrecisError::Config(
                "Chunk budget max_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.max_size {
            return Err(PrecisError::Config(format!(
                "Chunk overlap ({}) must be smaller than max_size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }
}

/// Length of a string in characters (Unicode scalar values).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
