//! Bullets command implementation.

use super::session;
use crate::cli::{Output, RunArgs};
use crate::config::Settings;
use crate::error::PrecisError;
use anyhow::Result;

/// Run the bullets command.
pub async fn run_bullets(
    input: &str,
    condensed: bool,
    args: &RunArgs,
    settings: Settings,
) -> Result<()> {
    let orchestrator = session::start(settings, &args.common)?;
    let text = session::load_input(&orchestrator, input).await?;
    let directive = orchestrator.directive(args.lang.as_deref());

    let spinner = Output::spinner(if condensed {
        "Condensing key points..."
    } else {
        "Extracting key points..."
    });
    let bullets = if condensed {
        orchestrator.condensed_bullets(&text, &directive).await
    } else {
        orchestrator.extended_bullets(&text, &directive).await
    };
    spinner.finish_and_clear();

    let bullets = match bullets {
        Ok(bullets) => bullets,
        Err(PrecisError::Convergence {
            passes,
            threshold,
            best_len,
            best_effort,
        }) if orchestrator.settings().condensation.accept_best_effort => {
            Output::warning(&format!(
                "Bullets still {} chars after {} passes (target {}); keeping the shortest result.",
                best_len, passes, threshold
            ));
            best_effort
        }
        Err(e) => {
            Output::error(&format!("Failed to extract bullets: {}", e));
            return Err(e.into());
        }
    };

    session::deliver(
        &orchestrator,
        bullets,
        args.translate.as_deref(),
        args.common.output.as_deref(),
    )
    .await
}
