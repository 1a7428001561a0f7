//! Summarize command implementation.

use super::session;
use crate::cli::{Output, RunArgs};
use crate::config::Settings;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(input: &str, args: &RunArgs, settings: Settings) -> Result<()> {
    let orchestrator = session::start(settings, &args.common)?;
    let text = session::load_input(&orchestrator, input).await?;
    let directive = orchestrator.directive(args.lang.as_deref());

    let spinner = Output::spinner("Summarizing...");
    let summary = orchestrator.textual_summary(&text, &directive).await;
    spinner.finish_and_clear();

    let summary = match summary {
        Ok(summary) => summary,
        Err(e) => {
            Output::error(&format!("Failed to summarize: {}", e));
            return Err(e.into());
        }
    };

    session::deliver(
        &orchestrator,
        summary,
        args.translate.as_deref(),
        args.common.output.as_deref(),
    )
    .await
}
