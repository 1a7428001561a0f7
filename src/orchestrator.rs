//! Pipeline orchestrator for Precis.
//!
//! Wires settings, prompts, the transform capability and the language policy
//! into the user-facing operations.

use crate::chunking::{char_len, BudgetSpec, Splitter};
use crate::config::{PromptTemplate, Prompts, Settings};
use crate::error::{PrecisError, Result};
use crate::language::{LanguagePolicy, TransformDirective};
use crate::pipeline::{CallPolicy, ChunkTransformer, Combiner, CondensationLoop, Cycle};
use crate::source::punctuation_percentage;
use crate::transform::{OpenAiTransformer, TransformCapability};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// The main orchestrator for the Precis pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    transform: Arc<dyn TransformCapability>,
    language: LanguagePolicy,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Create a new orchestrator backed by the configured chat model.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        info!("Using {} for text transforms", settings.transform.model);
        let transform: Arc<dyn TransformCapability> =
            Arc::new(OpenAiTransformer::with_config(&settings.transform)?);

        Ok(Self::with_components(
            settings,
            prompts,
            transform,
            LanguagePolicy::default(),
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        transform: Arc<dyn TransformCapability>,
        language: LanguagePolicy,
    ) -> Self {
        Self {
            settings,
            prompts,
            transform,
            language,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a cancellation token with every stage this orchestrator runs.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directive for a run; `forced` overrides the configured language.
    pub fn directive(&self, forced: Option<&str>) -> TransformDirective {
        let code = forced.or(self.settings.language.forced_code.as_deref());
        self.language.resolve(code)
    }

    /// Whether `text` has too little punctuation to split on sentence boundaries.
    pub fn needs_punctuation(&self, text: &str) -> bool {
        punctuation_percentage(text) < self.settings.source.min_punctuation_percent
    }

    /// Narrative summary: per-chunk summaries, merged by a reduce call when they do not fit.
    #[instrument(skip(self, text, directive), fields(chars = char_len(text), directive = %directive))]
    pub async fn textual_summary(
        &self,
        text: &str,
        directive: &TransformDirective,
    ) -> Result<String> {
        ensure_input(text)?;

        let map = self.prompts.template(&self.prompts.summary.map);
        let reduce = self.prompts.template(&self.prompts.summary.reduce);
        let splitter = self.splitter_for(&map, directive)?;
        let reduce_limit = self.text_room(&reduce, directive)?;

        let transformer = self.transformer();
        let combiner = Combiner::hierarchical(reduce)
            .with_reduce_limit(reduce_limit)
            .with_policy(self.call_policy())
            .with_cancellation(self.cancel.clone());

        let cycle = Cycle {
            splitter: &splitter,
            transformer: &transformer,
            combiner: &combiner,
            template: &map,
            transform: self.transform.as_ref(),
        };
        cycle.run(text, directive).await
    }

    /// Bullet points for every chunk, concatenated.
    #[instrument(skip(self, text, directive), fields(chars = char_len(text), directive = %directive))]
    pub async fn extended_bullets(
        &self,
        text: &str,
        directive: &TransformDirective,
    ) -> Result<String> {
        ensure_input(text)?;
        self.run_flat(text, &self.prompts.bullets.map, directive)
            .await
    }

    /// Bullet points re-summarized until they fit the condensation threshold.
    #[instrument(skip(self, text, directive), fields(chars = char_len(text), directive = %directive))]
    pub async fn condensed_bullets(
        &self,
        text: &str,
        directive: &TransformDirective,
    ) -> Result<String> {
        ensure_input(text)?;

        let template = self.prompts.template(&self.prompts.bullets.map);
        let splitter = self.splitter_for(&template, directive)?;
        let transformer = self.transformer();
        let combiner = self.flat_combiner();

        let condenser = CondensationLoop::new(
            self.settings.condensation_threshold(),
            self.settings.condensation.max_passes,
        )?
        .with_cancellation(self.cancel.clone());

        let cycle = Cycle {
            splitter: &splitter,
            transformer: &transformer,
            combiner: &combiner,
            template: &template,
            transform: self.transform.as_ref(),
        };
        condenser.condense(text, directive, &cycle).await
    }

    /// Translate `text` into the language named by `language_code`.
    #[instrument(skip(self, text), fields(chars = char_len(text)))]
    pub async fn translate(&self, text: &str, language_code: &str) -> Result<String> {
        ensure_input(text)?;

        let directive = self.language.resolve(Some(language_code));
        if directive == TransformDirective::OriginalLanguage {
            return Err(PrecisError::InvalidInput(
                "Translation needs a target language code".to_string(),
            ));
        }

        self.run_flat(text, &self.prompts.translation.template, &directive)
            .await
    }

    /// Restore punctuation and capitalization, chunk by chunk.
    #[instrument(skip(self, text, directive), fields(chars = char_len(text), directive = %directive))]
    pub async fn restore_punctuation(
        &self,
        text: &str,
        directive: &TransformDirective,
    ) -> Result<String> {
        ensure_input(text)?;
        self.run_flat(text, &self.prompts.punctuation.template, directive)
            .await
    }

    async fn run_flat(
        &self,
        text: &str,
        body: &str,
        directive: &TransformDirective,
    ) -> Result<String> {
        let template = self.prompts.template(body);
        let splitter = self.splitter_for(&template, directive)?;
        let transformer = self.transformer();
        let combiner = self.flat_combiner();

        let cycle = Cycle {
            splitter: &splitter,
            transformer: &transformer,
            combiner: &combiner,
            template: &template,
            transform: self.transform.as_ref(),
        };
        cycle.run(text, directive).await
    }

    fn splitter_for(
        &self,
        template: &PromptTemplate,
        directive: &TransformDirective,
    ) -> Result<Splitter> {
        let budget = BudgetSpec::for_prompt(
            self.settings.chunking.context_max_chars,
            template.overhead(directive),
            self.settings.chunking.overlap,
        )?;
        Splitter::new(budget)
    }

    /// Characters left for text once `template` is rendered.
    fn text_room(&self, template: &PromptTemplate, directive: &TransformDirective) -> Result<usize> {
        let context = self.settings.chunking.context_max_chars;
        let overhead = template.overhead(directive);
        context
            .checked_sub(overhead)
            .filter(|room| *room > 0)
            .ok_or_else(|| {
                PrecisError::Config(format!(
                    "Prompt template ({} chars) leaves no room for text within the context limit ({} chars)",
                    overhead, context
                ))
            })
    }

    fn call_policy(&self) -> CallPolicy {
        CallPolicy::from_settings(&self.settings.transform)
    }

    fn transformer(&self) -> ChunkTransformer {
        ChunkTransformer::new(self.settings.transform.max_concurrent)
            .with_policy(self.call_policy())
            .with_cancellation(self.cancel.clone())
    }

    fn flat_combiner(&self) -> Combiner {
        Combiner::flat()
            .with_policy(self.call_policy())
            .with_cancellation(self.cancel.clone())
    }
}

fn ensure_input(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(PrecisError::InvalidInput("Input text is empty".to_string()));
    }
    Ok(())
}
