//! Combine stage: merge transformed chunks back into one text.

use super::call::{invoke, CallPolicy};
use crate::chunking::{char_len, BudgetSpec, Chunk};
use crate::config::PromptTemplate;
use crate::error::{PrecisError, Result, TransformStage};
use crate::language::TransformDirective;
use crate::transform::TransformCapability;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Separator between partial results fed to a reduce call.
const PARTIAL_SEPARATOR: &str = "\n\n";

/// Upper bound on collapse rounds before the final reduce.
const MAX_COLLAPSE_ROUNDS: usize = 8;

/// How transformed chunks are merged.
#[derive(Debug, Clone)]
pub enum CombineStrategy {
    /// Newline-joined transformed texts, in chunk order.
    Flat,
    /// Flat join when it fits the budget, otherwise a reduce call over the partial results.
    Hierarchical {
        reduce: PromptTemplate,
        /// Largest text a single reduce call may receive. None = unbounded.
        reduce_limit: Option<usize>,
    },
}

/// Merges a mapped document sequence into a single result.
#[derive(Debug, Clone)]
pub struct Combiner {
    strategy: CombineStrategy,
    policy: CallPolicy,
    cancel: CancellationToken,
}

impl Combiner {
    pub fn flat() -> Self {
        Self::with_strategy(CombineStrategy::Flat)
    }

    /// Hierarchical combine reducing with `reduce`, which must differ from the map template.
    pub fn hierarchical(reduce: PromptTemplate) -> Self {
        Self::with_strategy(CombineStrategy::Hierarchical {
            reduce,
            reduce_limit: None,
        })
    }

    fn with_strategy(strategy: CombineStrategy) -> Self {
        Self {
            strategy,
            policy: CallPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Bound the text of each reduce call; larger inputs are collapsed in groups first.
    pub fn with_reduce_limit(mut self, limit: usize) -> Self {
        if let CombineStrategy::Hierarchical { reduce_limit, .. } = &mut self.strategy {
            *reduce_limit = Some(limit);
        }
        self
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[instrument(skip_all, fields(chunks = chunks.len(), max_size = budget.max_size))]
    pub async fn combine(
        &self,
        chunks: &[Chunk],
        directive: &TransformDirective,
        budget: &BudgetSpec,
        transform: &dyn TransformCapability,
    ) -> Result<String> {
        let joined = join_flat(chunks);

        let (reduce, reduce_limit) = match &self.strategy {
            CombineStrategy::Flat => return Ok(joined),
            CombineStrategy::Hierarchical {
                reduce,
                reduce_limit,
            } => (reduce, *reduce_limit),
        };

        if char_len(&joined) <= budget.max_size {
            debug!(
                "Combined text fits the budget ({} <= {}), skipping reduce",
                char_len(&joined),
                budget.max_size
            );
            return Ok(joined);
        }

        if let Some(chunk) = chunks
            .iter()
            .find(|c| char_len(c.transformed()) > budget.max_size)
        {
            return Err(PrecisError::Config(format!(
                "Transformed chunk {} ({} chars) is larger than the combine budget ({} chars)",
                chunk.index,
                char_len(chunk.transformed()),
                budget.max_size
            )));
        }

        let mut partials: Vec<String> = chunks.iter().map(|c| c.transformed().to_string()).collect();
        let limit = reduce_limit.unwrap_or(usize::MAX);

        for round in 0..=MAX_COLLAPSE_ROUNDS {
            let joined = partials.join(PARTIAL_SEPARATOR);
            if char_len(&joined) <= limit {
                info!("Reducing {} partial results", partials.len());
                return self.reduce(reduce, &joined, directive, transform).await;
            }
            if round == MAX_COLLAPSE_ROUNDS {
                break;
            }

            let groups = group_partials(&partials, limit);
            if groups.len() >= partials.len() {
                return Err(PrecisError::Config(format!(
                    "Reduce input ({} chars) exceeds the reduce limit ({} chars) and cannot shrink further",
                    char_len(&joined),
                    limit
                )));
            }

            info!(
                "Collapse round {}: {} partial results into {} groups",
                round + 1,
                partials.len(),
                groups.len()
            );

            let mut collapsed = Vec::with_capacity(groups.len());
            for group in groups {
                if group.len() == 1 {
                    collapsed.push(group[0].to_string());
                } else {
                    let text = group.join(PARTIAL_SEPARATOR);
                    collapsed.push(self.reduce(reduce, &text, directive, transform).await?);
                }
            }
            partials = collapsed;
        }

        Err(PrecisError::Config(format!(
            "Partial results did not fit the reduce limit ({} chars) after {} collapse rounds",
            limit, MAX_COLLAPSE_ROUNDS
        )))
    }

    async fn reduce(
        &self,
        template: &PromptTemplate,
        text: &str,
        directive: &TransformDirective,
        transform: &dyn TransformCapability,
    ) -> Result<String> {
        let prompt = template.render(text, directive);
        let output = invoke(
            transform,
            &prompt,
            &self.policy,
            &self.cancel,
            TransformStage::Reduce,
            directive,
        )
        .await?;
        Ok(output.text)
    }
}

/// Newline-joined transformed texts, in chunk order.
pub fn join_flat(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(Chunk::transformed)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Greedy, order-preserving grouping where each group's joined text fits `limit`.
fn group_partials(partials: &[String], limit: usize) -> Vec<Vec<&str>> {
    let separator_len = char_len(PARTIAL_SEPARATOR);
    let mut groups: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for partial in partials {
        let len = char_len(partial);
        let added = if current.is_empty() {
            len
        } else {
            separator_len + len
        };
        if !current.is_empty() && current_len + added > limit {
            groups.push(std::mem::take(&mut current));
            current_len = 0;
            current.push(partial);
            current_len += len;
        } else {
            current.push(partial);
            current_len += added;
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformFailure;
    use crate::transform::fake::{between, FakeTransformer};

    fn mapped(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut chunk = Chunk::new(i, format!("source text {}", i));
                chunk.transformed_text = Some(t.to_string());
                chunk
            })
            .collect()
    }

    fn budget(max_size: usize) -> BudgetSpec {
        BudgetSpec::new(max_size).unwrap()
    }

    fn reduce_template() -> PromptTemplate {
        PromptTemplate::new("REDUCE [{{text}}]")
    }

    #[tokio::test]
    async fn test_flat_join_in_order() {
        let fake = FakeTransformer::new(|_| Ok("unused".to_string()));
        let chunks = mapped(&["- one", "- two", "- three"]);

        let combined = Combiner::flat()
            .combine(&chunks, &TransformDirective::OriginalLanguage, &budget(5), &fake)
            .await
            .unwrap();

        assert_eq!(combined, "- one\n- two\n- three");
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_flat_single_chunk_is_identity() {
        let fake = FakeTransformer::new(|_| Ok("unused".to_string()));
        let chunks = mapped(&["only result"]);

        let combined = Combiner::flat()
            .combine(&chunks, &TransformDirective::OriginalLanguage, &budget(5), &fake)
            .await
            .unwrap();

        assert_eq!(combined, "only result");
    }

    #[tokio::test]
    async fn test_hierarchical_fast_path_makes_no_call() {
        let fake = FakeTransformer::new(|_| Ok("unused".to_string()));
        let chunks = mapped(&["short", "texts"]);

        let combined = Combiner::hierarchical(reduce_template())
            .combine(&chunks, &TransformDirective::OriginalLanguage, &budget(100), &fake)
            .await
            .unwrap();

        assert_eq!(combined, "short\ntexts");
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reduce_uses_only_reduce_template_and_partials() {
        let fake = FakeTransformer::new(|_| Ok("verbose summary".to_string()));
        let partial = "p".repeat(40);
        let chunks = mapped(&[&partial, &partial, &partial]);
        let directive = TransformDirective::ForcedLanguage {
            code: "es".to_string(),
            name: "Spanish".to_string(),
        };

        let combined = Combiner::hierarchical(reduce_template())
            .with_policy(CallPolicy::once())
            .combine(&chunks, &directive, &budget(100), &fake)
            .await
            .unwrap();

        assert_eq!(combined, "verbose summary");
        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("REDUCE ["));
        assert!(!calls[0].contains("source text"));
        assert_eq!(
            between(&calls[0], "[", "]"),
            [partial.as_str(); 3].join("\n\n")
        );
    }

    #[tokio::test]
    async fn test_collapses_partials_over_reduce_limit() {
        let fake = FakeTransformer::new(|p| {
            let text = between(p, "[", "]");
            Ok(format!("r{}", text.len()))
        });
        let partial = "p".repeat(40);
        let chunks = mapped(&[&partial, &partial, &partial]);

        let combined = Combiner::hierarchical(reduce_template())
            .with_reduce_limit(90)
            .with_policy(CallPolicy::once())
            .combine(&chunks, &TransformDirective::OriginalLanguage, &budget(100), &fake)
            .await
            .unwrap();

        // First two partials collapse to "r82", then "r82\n\n" + 40 chars is reduced.
        assert_eq!(fake.call_count(), 2);
        assert_eq!(combined, "r45");
    }

    #[tokio::test]
    async fn test_oversized_transformed_chunk_is_config_error() {
        let fake = FakeTransformer::new(|_| Ok("unused".to_string()));
        let big = "x".repeat(150);
        let chunks = mapped(&["small", &big]);

        let err = Combiner::hierarchical(reduce_template())
            .combine(&chunks, &TransformDirective::OriginalLanguage, &budget(100), &fake)
            .await
            .unwrap_err();

        assert!(matches!(err, PrecisError::Config(_)));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unshrinkable_reduce_input_is_config_error() {
        let fake = FakeTransformer::new(|_| Ok("unused".to_string()));
        let partial = "p".repeat(60);
        let chunks = mapped(&[&partial, &partial]);

        let err = Combiner::hierarchical(reduce_template())
            .with_reduce_limit(70)
            .combine(&chunks, &TransformDirective::OriginalLanguage, &budget(100), &fake)
            .await
            .unwrap_err();

        assert!(matches!(err, PrecisError::Config(_)));
    }

    #[tokio::test]
    async fn test_reduce_failure_reports_reduce_stage() {
        let fake = FakeTransformer::new(|_| Err(TransformFailure::Transport("down".to_string())));
        let partial = "p".repeat(60);
        let chunks = mapped(&[&partial, &partial]);

        let err = Combiner::hierarchical(reduce_template())
            .with_policy(CallPolicy::once())
            .combine(&chunks, &TransformDirective::OriginalLanguage, &budget(100), &fake)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PrecisError::Transform {
                stage: TransformStage::Reduce,
                ..
            }
        ));
        assert_eq!(err.failed_chunk(), None);
    }

    #[test]
    fn test_grouping_preserves_order() {
        let partials: Vec<String> = ["aaaa", "bb", "cccc", "d"].iter().map(|s| s.to_string()).collect();
        let groups = group_partials(&partials, 8);
        assert_eq!(groups, vec![vec!["aaaa", "bb"], vec!["cccc", "d"]]);
    }
}
