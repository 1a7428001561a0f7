//! Map stage: one transform call per chunk, run concurrently.

use super::call::{invoke, CallPolicy};
use crate::chunking::{char_len, Chunk};
use crate::config::PromptTemplate;
use crate::error::{PrecisError, Result, TransformStage};
use crate::language::TransformDirective;
use crate::transform::TransformCapability;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Applies a prompt template to every chunk of a document sequence.
#[derive(Debug, Clone)]
pub struct ChunkTransformer {
    max_concurrent: usize,
    policy: CallPolicy,
    cancel: CancellationToken,
}

impl ChunkTransformer {
    /// Create a transformer running at most `max_concurrent` calls at once.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            policy: CallPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Transform each chunk and return the sequence in its original order.
    ///
    /// Calls are submitted in chunk order. The first failure aborts the stage:
    /// calls still in flight are dropped and no further chunk is started.
    #[instrument(skip_all, fields(chunks = chunks.len(), directive = %directive))]
    pub async fn map(
        &self,
        chunks: Vec<Chunk>,
        template: &PromptTemplate,
        directive: &TransformDirective,
        transform: &dyn TransformCapability,
    ) -> Result<Vec<Chunk>> {
        if self.cancel.is_cancelled() {
            return Err(PrecisError::Cancelled);
        }
        if chunks.is_empty() {
            return Ok(chunks);
        }

        let total = chunks.len();
        info!(
            "Transforming {} chunks ({} concurrent)",
            total, self.max_concurrent
        );

        let mut stream = stream::iter(chunks.into_iter().enumerate())
            .map(|(slot, chunk)| async move {
                let prompt = template.render(&chunk.source_text, directive);
                debug!(
                    "Chunk {}: {} source chars, {} prompt chars",
                    chunk.index,
                    chunk.len(),
                    char_len(&prompt)
                );
                let stage = TransformStage::Map {
                    chunk_index: chunk.index,
                };
                let result =
                    invoke(transform, &prompt, &self.policy, &self.cancel, stage, directive).await;
                (slot, chunk, result)
            })
            .buffer_unordered(self.max_concurrent);

        let mut slots: Vec<Option<Chunk>> = vec![None; total];

        while let Some((slot, mut chunk, result)) = stream.next().await {
            let output = result?;
            debug!(
                "Chunk {} done: {} chars",
                chunk.index,
                char_len(&output.text)
            );
            chunk.transformed_text = Some(output.text);
            chunk.metadata = output.metadata;
            slots[slot] = Some(chunk);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

impl Default for ChunkTransformer {
    fn default() -> Self {
        Self::new(crate::config::TransformSettings::default().max_concurrent)
    }
}
