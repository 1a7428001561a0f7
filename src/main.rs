//! Precis CLI entry point.

use anyhow::Result;
use clap::Parser;
use precis::cli::{commands, Cli, Commands};
use precis::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Model settings and OPENAI_API_KEY may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("precis={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Execute command
    match &cli.command {
        Commands::Summarize { input, run } => {
            commands::run_summarize(input, run, settings).await?;
        }

        Commands::Bullets {
            input,
            condensed,
            run,
        } => {
            commands::run_bullets(input, *condensed, run, settings).await?;
        }

        Commands::Translate {
            input,
            language,
            common,
        } => {
            commands::run_translate(input, language, common, settings).await?;
        }

        Commands::Languages => {
            commands::run_languages();
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path)?;
        }
    }

    Ok(())
}
