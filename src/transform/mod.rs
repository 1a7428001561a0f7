//! External text-transformation capability.
//!
//! Summarization, bullet extraction, translation and punctuation restoration all
//! go through the same capability; only the prompt differs.

mod openai;

#[cfg(test)]
pub(crate) mod fake;

pub use openai::OpenAiTransformer;

use crate::chunking::Metadata;
use crate::error::TransformFailure;
use async_trait::async_trait;

/// Text returned by a transform call, with whatever metadata the backend reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    pub text: String,
    pub metadata: Metadata,
}

impl TransformOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }
}

/// Trait for text-transformation backends.
#[async_trait]
pub trait TransformCapability: Send + Sync {
    /// Run one prompt and return the transformed text.
    async fn invoke(&self, prompt: &str) -> std::result::Result<TransformOutput, TransformFailure>;
}
