//! CLI module for Precis.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// Precis - summarize, bullet and translate long texts
///
/// Splits long inputs into overlapping chunks, runs each chunk through a
/// language model and merges the results.
#[derive(Parser, Debug)]
#[command(name = "precis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PRECIS_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a narrative summary of a text, file or web page
    Summarize {
        /// Text, file path or http(s) URL
        input: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Extract the key points as bullet lists
    Bullets {
        /// Text, file path or http(s) URL
        input: String,

        /// Re-summarize the bullets until they fit the condensation threshold
        #[arg(long)]
        condensed: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Translate a text, file or web page
    Translate {
        /// Text, file path or http(s) URL
        input: String,

        /// Target language (ISO 639-1 code, e.g. "fr")
        language: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the language codes accepted by --lang and translate
    Languages,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by summarize and bullets.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Reply in this language (ISO 639-1 code) instead of the source language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Translate the result into this language afterwards
    #[arg(short, long)]
    pub translate: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options shared by every pipeline command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Chat model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Restore punctuation first when the input has almost none
    #[arg(long)]
    pub punctuate: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
