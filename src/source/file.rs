//! Local file source.
//!
//! Supports plain text, PDF, HTML and audio files.

use super::analysis::collapse_spaces;
use super::transcribe::AudioTranscriber;
use super::web::html_to_text;
use super::TextSource;
use crate::config::SourceSettings;
use crate::error::{PrecisError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Extensions read as UTF-8 text.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "csv", "tsv", "log", "json", "yaml", "yml", "toml", "xml",
    "tex", "rs", "py", "cs", "sql", "js", "ts", "java", "c", "h", "cpp", "go", "rb", "sh",
];

const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

/// Supported audio file extensions.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "flac", "webm"];

/// How a file's text is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Pdf,
    Html,
    Audio,
}

impl FileKind {
    /// Detect the kind from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let ext = ext.as_str();
        if TEXT_EXTENSIONS.contains(&ext) {
            Some(FileKind::Text)
        } else if ext == "pdf" {
            Some(FileKind::Pdf)
        } else if HTML_EXTENSIONS.contains(&ext) {
            Some(FileKind::Html)
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Some(FileKind::Audio)
        } else {
            None
        }
    }
}

/// Text loaded from a local file.
pub struct FileSource {
    path: PathBuf,
    kind: FileKind,
    settings: SourceSettings,
    api_base: Option<String>,
}

impl FileSource {
    /// Create a source for `path`; fails for unsupported extensions.
    pub fn new(path: PathBuf, settings: SourceSettings, api_base: Option<String>) -> Result<Self> {
        let kind = FileKind::from_path(&path).ok_or_else(|| {
            PrecisError::Source(format!("Unsupported file format: {}", path.display()))
        })?;
        Ok(Self {
            path,
            kind,
            settings,
            api_base,
        })
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    async fn read_utf8(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                PrecisError::Source(format!("{} is not valid UTF-8", self.path.display()))
            } else {
                PrecisError::Io(e)
            }
        })
    }

    async fn extract_pdf(&self) -> Result<String> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| PrecisError::Source(format!("PDF extraction task failed: {}", e)))?
            .map_err(|e| {
                PrecisError::Source(format!(
                    "Failed to extract text from {}: {}",
                    self.path.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl TextSource for FileSource {
    #[instrument(skip(self), fields(path = %self.path.display(), kind = ?self.kind))]
    async fn load_text(&self) -> Result<String> {
        let text = match self.kind {
            FileKind::Text => collapse_spaces(&self.read_utf8().await?),
            FileKind::Html => html_to_text(&self.read_utf8().await?),
            FileKind::Pdf => self.extract_pdf().await?,
            FileKind::Audio => {
                info!("Transcribing audio with {}", self.settings.transcription_model);
                AudioTranscriber::with_config(
                    &self.settings.transcription_model,
                    self.api_base.as_deref(),
                )?
                .transcribe(&self.path)
                .await?
            }
        };

        debug!("Loaded {} chars", text.chars().count());
        Ok(text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source(path: PathBuf) -> Result<FileSource> {
        FileSource::new(path, SourceSettings::default(), None)
    }

    #[test]
    fn test_kind_detection() {
        assert_eq!(FileKind::from_path(Path::new("a/notes.MD")), Some(FileKind::Text));
        assert_eq!(FileKind::from_path(Path::new("book.pdf")), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path(Path::new("page.htm")), Some(FileKind::Html));
        assert_eq!(FileKind::from_path(Path::new("talk.flac")), Some(FileKind::Audio));
        assert_eq!(FileKind::from_path(Path::new("image.png")), None);
        assert_eq!(FileKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_unsupported_extension_is_source_error() {
        assert!(matches!(
            source(PathBuf::from("photo.jpg")),
            Err(PrecisError::Source(_))
        ));
    }

    #[tokio::test]
    async fn test_text_file_collapses_spaces() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Hello   world.\n\nSecond  paragraph.").unwrap();

        let text = source(file.path().to_path_buf())
            .unwrap()
            .load_text()
            .await
            .unwrap();

        assert_eq!(text, "Hello world.\n\nSecond paragraph.");
    }

    #[tokio::test]
    async fn test_html_file_is_reduced_to_text() {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        write!(file, "<html><body><p>One.</p><p>Two.</p></body></html>").unwrap();

        let text = source(file.path().to_path_buf())
            .unwrap()
            .load_text()
            .await
            .unwrap();

        assert_eq!(text, "One.\n\nTwo.");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_source_error() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(&[0xff, 0xfe, 0xfd]).unwrap();

        let err = source(file.path().to_path_buf())
            .unwrap()
            .load_text()
            .await
            .unwrap_err();

        assert!(matches!(err, PrecisError::Source(_)));
    }

    #[tokio::test]
    async fn test_broken_pdf_is_source_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(file, "not a pdf").unwrap();

        let err = source(file.path().to_path_buf())
            .unwrap()
            .load_text()
            .await
            .unwrap_err();

        assert!(matches!(err, PrecisError::Source(_)));
    }
}
