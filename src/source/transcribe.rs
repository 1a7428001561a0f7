//! Audio transcription through the OpenAI audio endpoint.

use crate::error::{PrecisError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use std::path::Path;
use tracing::{debug, instrument};

/// Largest file the transcription endpoint accepts.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Turns an audio file into plain text.
pub struct AudioTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl AudioTranscriber {
    /// Create a transcriber for `model`, optionally against a compatible endpoint.
    pub fn with_config(model: &str, api_base: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: create_client(api_base)?,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Transcribe a single audio file to plain text.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let size = tokio::fs::metadata(audio_path).await?.len();
        check_upload_size(size)?;

        debug!("Transcribing {} bytes with {}", size, self.model);
        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| PrecisError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| PrecisError::OpenAI(format!("{} API error: {}", self.model, e)))?;

        Ok(response.text.trim().to_string())
    }
}

fn check_upload_size(size: u64) -> Result<()> {
    if size > MAX_UPLOAD_BYTES {
        return Err(PrecisError::Transcription(format!(
            "Audio file is {:.1} MB, the transcription limit is {} MB",
            size as f64 / (1024.0 * 1024.0),
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}
