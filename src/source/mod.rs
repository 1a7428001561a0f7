//! Text sources for Precis.
//!
//! Inputs are classified once, up front, as raw text, a local file or a URL.
//! The pipeline only ever sees the loaded text.

mod analysis;
mod file;
mod transcribe;
mod web;

pub use analysis::{collapse_spaces, punctuation_percentage};
pub use file::{FileKind, FileSource, AUDIO_EXTENSIONS};
pub use transcribe::{AudioTranscriber, MAX_UPLOAD_BYTES};
pub use web::{html_to_text, WebSource};

use crate::config::Settings;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// What an input string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    RawText(String),
    FilePath(PathBuf),
    Url(Url),
}

/// Classify a user-supplied input.
///
/// http(s) URLs and paths to existing files are recognized; anything else is
/// taken as the text itself.
pub fn classify(input: &str) -> InputKind {
    let trimmed = input.trim();

    if let Ok(url) = Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https") {
            return InputKind::Url(url);
        }
    }

    if !trimmed.is_empty() && !trimmed.contains('\n') {
        let path = Settings::expand_path(trimmed);
        if path.is_file() {
            return InputKind::FilePath(path);
        }
    }

    InputKind::RawText(input.to_string())
}

/// Trait for anything that supplies text to the pipeline.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Load the full text.
    async fn load_text(&self) -> Result<String>;

    /// Short human-readable description for logs and progress output.
    fn describe(&self) -> String;
}

/// Text passed directly on the command line.
pub struct RawText(String);

impl RawText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

#[async_trait]
impl TextSource for RawText {
    async fn load_text(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("text ({} chars)", self.0.chars().count())
    }
}

/// Build the source for a classified input.
pub fn create_source(kind: InputKind, settings: &Settings) -> Result<Box<dyn TextSource>> {
    Ok(match kind {
        InputKind::RawText(text) => Box::new(RawText::new(text)),
        InputKind::FilePath(path) => Box::new(FileSource::new(
            path,
            settings.source.clone(),
            settings.transform.api_base.clone(),
        )?),
        InputKind::Url(url) => Box::new(WebSource::new(
            url,
            Duration::from_secs(settings.source.http_timeout_seconds),
        )),
    })
}

/// Classify `input` and load its text.
pub async fn load_text(input: &str, settings: &Settings) -> Result<String> {
    create_source(classify(input), settings)?.load_text().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_classify_url() {
        assert!(matches!(
            classify("https://example.com/article"),
            InputKind::Url(url) if url.host_str() == Some("example.com")
        ));
        assert!(matches!(classify("ftp://example.com/file"), InputKind::RawText(_)));
    }

    #[test]
    fn test_classify_existing_file() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let input = file.path().to_str().unwrap();
        assert_eq!(classify(input), InputKind::FilePath(file.path().to_path_buf()));
    }

    #[test]
    fn test_classify_raw_text() {
        assert_eq!(
            classify("Just some words."),
            InputKind::RawText("Just some words.".to_string())
        );
        assert_eq!(
            classify("/no/such/file.txt"),
            InputKind::RawText("/no/such/file.txt".to_string())
        );
    }

    #[tokio::test]
    async fn test_load_text_from_file_and_raw() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "# Title\n\nBody").unwrap();
        let settings = Settings::default();

        let loaded = load_text(file.path().to_str().unwrap(), &settings).await.unwrap();
        assert_eq!(loaded, "# Title\n\nBody");

        let raw = load_text("inline text", &settings).await.unwrap();
        assert_eq!(raw, "inline text");
    }
}
