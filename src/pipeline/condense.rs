//! Repeated condensation of a text until it fits a length threshold.

use super::{ChunkTransformer, Combiner};
use crate::chunking::{char_len, Splitter};
use crate::config::PromptTemplate;
use crate::error::{PrecisError, Result};
use crate::language::TransformDirective;
use crate::transform::TransformCapability;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// One split → map → combine run over a text.
pub struct Cycle<'a> {
    pub splitter: &'a Splitter,
    pub transformer: &'a ChunkTransformer,
    pub combiner: &'a Combiner,
    pub template: &'a PromptTemplate,
    pub transform: &'a dyn TransformCapability,
}

impl Cycle<'_> {
    pub async fn run(&self, text: &str, directive: &TransformDirective) -> Result<String> {
        let chunks = self.splitter.split(text);
        let mapped = self
            .transformer
            .map(chunks, self.template, directive, self.transform)
            .await?;
        self.combiner
            .combine(&mapped, directive, &self.splitter.budget(), self.transform)
            .await
    }
}

/// Re-runs a cycle on its own output until the result is at most `threshold` characters.
#[derive(Debug, Clone)]
pub struct CondensationLoop {
    threshold: usize,
    max_passes: usize,
    cancel: CancellationToken,
}

impl CondensationLoop {
    /// `max_passes` counts every pass, the first one included.
    pub fn new(threshold: usize, max_passes: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(PrecisError::Config(
                "Condensation threshold must be greater than zero".to_string(),
            ));
        }
        if max_passes == 0 {
            return Err(PrecisError::Config(
                "Condensation needs at least one pass".to_string(),
            ));
        }
        Ok(Self {
            threshold,
            max_passes,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Condense `text`.
    ///
    /// Fails with [`PrecisError::Convergence`] after `max_passes` passes that all
    /// ended above the threshold; the error carries the shortest output seen.
    #[instrument(skip_all, fields(threshold = self.threshold, max_passes = self.max_passes))]
    pub async fn condense(
        &self,
        text: &str,
        directive: &TransformDirective,
        cycle: &Cycle<'_>,
    ) -> Result<String> {
        let mut input = text.to_string();
        let mut best: Option<String> = None;

        for pass in 1..=self.max_passes {
            if self.cancel.is_cancelled() {
                return Err(PrecisError::Cancelled);
            }

            let output = cycle.run(&input, directive).await?;
            let len = char_len(&output);
            info!(
                "Condensation pass {}/{}: {} -> {} chars",
                pass,
                self.max_passes,
                char_len(&input),
                len
            );

            if len <= self.threshold {
                return Ok(output);
            }

            if best.as_ref().map_or(true, |b| len < char_len(b)) {
                best = Some(output.clone());
            }
            input = output;
        }

        let best_effort = best.unwrap_or_default();
        let best_len = char_len(&best_effort);
        warn!(
            "Condensation stopped after {} passes at {} chars (threshold {})",
            self.max_passes, best_len, self.threshold
        );
        Err(PrecisError::Convergence {
            passes: self.max_passes,
            threshold: self.threshold,
            best_len,
            best_effort,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::BudgetSpec;
    use crate::pipeline::CallPolicy;
    use crate::transform::fake::{between, FakeTransformer};

    struct Parts {
        splitter: Splitter,
        transformer: ChunkTransformer,
        combiner: Combiner,
        template: PromptTemplate,
    }

    fn parts() -> Parts {
        Parts {
            splitter: Splitter::new(BudgetSpec::new(200).unwrap()).unwrap(),
            transformer: ChunkTransformer::new(2).with_policy(CallPolicy::once()),
            combiner: Combiner::flat(),
            template: PromptTemplate::new("BULLETS [{{text}}]"),
        }
    }

    fn cycle<'a>(parts: &'a Parts, transform: &'a FakeTransformer) -> Cycle<'a> {
        Cycle {
            splitter: &parts.splitter,
            transformer: &parts.transformer,
            combiner: &parts.combiner,
            template: &parts.template,
            transform,
        }
    }

    #[tokio::test]
    async fn test_halving_transform_converges() {
        let fake = FakeTransformer::new(|p| {
            let text = between(p, "[", "]");
            Ok(text.chars().take(text.chars().count() / 2).collect())
        });
        let parts = parts();
        let text = "word ".repeat(100);

        let condensed = CondensationLoop::new(120, 10)
            .unwrap()
            .condense(&text, &TransformDirective::OriginalLanguage, &cycle(&parts, &fake))
            .await
            .unwrap();

        assert!(char_len(&condensed) <= 120);
    }

    #[tokio::test]
    async fn test_short_output_stops_after_one_pass() {
        let fake = FakeTransformer::new(|_| Ok("- done".to_string()));
        let parts = parts();

        let condensed = CondensationLoop::new(50, 5)
            .unwrap()
            .condense("a short text", &TransformDirective::OriginalLanguage, &cycle(&parts, &fake))
            .await
            .unwrap();

        assert_eq!(condensed, "- done");
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_identity_transform_stops_after_max_passes() {
        let fake = FakeTransformer::new(|p| Ok(between(p, "[", "]").to_string()));
        let parts = parts();
        let text = "z".repeat(150);

        let err = CondensationLoop::new(100, 3)
            .unwrap()
            .condense(&text, &TransformDirective::OriginalLanguage, &cycle(&parts, &fake))
            .await
            .unwrap_err();

        match err {
            PrecisError::Convergence {
                passes,
                threshold,
                best_len,
                best_effort,
            } => {
                assert_eq!(passes, 3);
                assert_eq!(threshold, 100);
                assert_eq!(best_len, 150);
                assert_eq!(best_effort, text);
            }
            other => panic!("unexpected error: {other}"),
        }
        // One chunk per pass.
        assert_eq!(fake.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cancel_during_first_pass_discards_output() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        // Cancels while answering, so pass 1 completes above the threshold.
        let fake = FakeTransformer::new(move |p| {
            trigger.cancel();
            Ok(between(p, "[", "]").to_string())
        });
        let parts = Parts {
            transformer: ChunkTransformer::new(2)
                .with_policy(CallPolicy::once())
                .with_cancellation(cancel.clone()),
            ..parts()
        };
        let text = "q".repeat(150);

        let err = CondensationLoop::new(10, 5)
            .unwrap()
            .with_cancellation(cancel)
            .condense(&text, &TransformDirective::OriginalLanguage, &cycle(&parts, &fake))
            .await
            .unwrap_err();

        assert!(matches!(err, PrecisError::Cancelled), "got {err}");
        assert_eq!(fake.call_count(), 1);
    }

    #[test]
    fn test_zero_passes_is_config_error() {
        assert!(matches!(
            CondensationLoop::new(100, 0),
            Err(PrecisError::Config(_))
        ));
    }
}
