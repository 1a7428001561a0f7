//! Translate command implementation.

use super::session;
use crate::cli::{CommonArgs, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the translate command.
pub async fn run_translate(
    input: &str,
    language: &str,
    common: &CommonArgs,
    settings: Settings,
) -> Result<()> {
    let orchestrator = session::start(settings, common)?;
    let text = session::load_input(&orchestrator, input).await?;

    let target = orchestrator.directive(Some(language));
    if target.is_fallback() {
        Output::warning(&format!(
            "Unknown language code '{}'; passing it to the model as is.",
            language
        ));
    }

    let spinner = Output::spinner(&format!(
        "Translating into {}...",
        target.language_name().unwrap_or(language)
    ));
    let translated = orchestrator.translate(&text, language).await;
    spinner.finish_and_clear();

    match translated {
        Ok(translated) => {
            Output::emit(&translated, common.output.as_deref())?;
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to translate: {}", e));
            Err(e.into())
        }
    }
}
