//! Shared setup for pipeline commands: pre-flight, cancellation, input and delivery.

use crate::cli::preflight;
use crate::cli::{CommonArgs, Output};
use crate::config::Settings;
use crate::language::TransformDirective;
use crate::orchestrator::Orchestrator;
use crate::source::{classify, create_source};
use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Build an orchestrator for a pipeline command.
///
/// Ctrl-C cancels whatever the orchestrator is running.
pub(super) fn start(mut settings: Settings, common: &CommonArgs) -> Result<Orchestrator> {
    if let Some(model) = &common.model {
        settings.transform.model = model.clone();
    }
    if common.punctuate {
        settings.source.restore_punctuation = true;
    }

    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            Output::warning("Cancelling...");
            trigger.cancel();
        }
    });

    Ok(Orchestrator::new(settings)?.with_cancellation(cancel))
}

/// Load the input text, restoring punctuation when it is missing and enabled.
pub(super) async fn load_input(orchestrator: &Orchestrator, input: &str) -> Result<String> {
    let settings = orchestrator.settings();
    let source = create_source(classify(input), settings)?;

    let spinner = Output::spinner(&format!("Loading {}...", source.describe()));
    let loaded = source.load_text().await;
    spinner.finish_and_clear();
    let text = loaded?;
    debug!("Loaded {} chars from {}", text.chars().count(), source.describe());

    if text.trim().is_empty() || !orchestrator.needs_punctuation(&text) {
        return Ok(text);
    }

    if !settings.source.restore_punctuation {
        Output::warning(
            "Input has almost no punctuation; results may suffer. Use --punctuate to restore it first.",
        );
        return Ok(text);
    }

    let spinner = Output::spinner("Restoring punctuation...");
    let restored = orchestrator
        .restore_punctuation(&text, &TransformDirective::OriginalLanguage)
        .await;
    spinner.finish_and_clear();
    Ok(restored?)
}

/// Optionally translate the result, then print or write it.
pub(super) async fn deliver(
    orchestrator: &Orchestrator,
    result: String,
    translate: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let result = match translate {
        Some(code) => {
            let spinner = Output::spinner(&format!("Translating into {}...", code));
            let translated = orchestrator.translate(&result, code).await;
            spinner.finish_and_clear();
            translated?
        }
        None => result,
    };

    Output::emit(&result, output)?;
    Ok(())
}
