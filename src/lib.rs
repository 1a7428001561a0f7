//! Precis - chunked summarization, bullet extraction and translation
//!
//! Precis takes texts of any length and runs them through a language model in
//! bounded pieces.
//!
//! # Overview
//!
//! Precis allows you to:
//! - Summarize long texts, files (text, PDF, HTML, audio) and web pages
//! - Extract key points as bullet lists, optionally condensed to a target length
//! - Translate results, or reply in a forced language
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `source` - Input classification and text loading
//! - `chunking` - Overlapping, size-bounded text splitting
//! - `language` - Output language directives
//! - `transform` - Text transform capability (chat completions)
//! - `pipeline` - Map, combine and condensation stages
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use precis::config::Settings;
//! use precis::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let text = std::fs::read_to_string("chapter.txt")?;
//!     let directive = orchestrator.directive(Some("fr"));
//!     let summary = orchestrator.textual_summary(&text, &directive).await?;
//!     println!("{}", summary);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod source;
pub mod transform;

pub use error::{PrecisError, Result};
