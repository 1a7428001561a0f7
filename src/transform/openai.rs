//! Chat-completion backed transform capability.

use super::{TransformCapability, TransformOutput};
use crate::chunking::Metadata;
use crate::config::TransformSettings;
use crate::error::{Result, TransformFailure};
use crate::openai::create_client_with_timeout;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// Transform capability backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiTransformer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiTransformer {
    /// Create a transformer with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(&TransformSettings::default())
    }

    /// Create a transformer from transform settings.
    pub fn with_config(settings: &TransformSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        Ok(Self {
            client: create_client_with_timeout(settings.api_base.as_deref(), timeout)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Map a client error onto the failure kinds the pipeline distinguishes.
    fn classify(&self, err: OpenAIError) -> TransformFailure {
        match err {
            OpenAIError::ApiError(api) => {
                let message = api.to_string();
                let lowered = message.to_lowercase();
                if lowered.contains("rate limit")
                    || lowered.contains("rate_limit")
                    || lowered.contains("quota")
                {
                    TransformFailure::RateLimited(message)
                } else {
                    TransformFailure::Transport(message)
                }
            }
            OpenAIError::Reqwest(e) if e.is_timeout() => TransformFailure::Timeout(self.timeout),
            OpenAIError::Reqwest(e) => TransformFailure::Transport(e.to_string()),
            OpenAIError::JSONDeserialize(e) => TransformFailure::MalformedResponse(e.to_string()),
            other => TransformFailure::Transport(other.to_string()),
        }
    }
}

#[async_trait]
impl TransformCapability for OpenAiTransformer {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn invoke(&self, prompt: &str) -> std::result::Result<TransformOutput, TransformFailure> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| TransformFailure::Transport(format!("Failed to build request: {}", e)))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TransformFailure::Transport(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| self.classify(e))?;

        let choice = response.choices.first().ok_or_else(|| {
            TransformFailure::MalformedResponse("Response contained no choices".to_string())
        })?;

        let text = choice.message.content.clone().ok_or_else(|| {
            TransformFailure::MalformedResponse("Empty response from LLM".to_string())
        })?;

        let mut metadata = Metadata::new();
        metadata.insert("model".to_string(), json!(response.model));
        if let Some(usage) = &response.usage {
            metadata.insert("prompt_tokens".to_string(), json!(usage.prompt_tokens));
            metadata.insert("completion_tokens".to_string(), json!(usage.completion_tokens));
            metadata.insert("total_tokens".to_string(), json!(usage.total_tokens));
        }
        if let Some(reason) = &choice.finish_reason {
            metadata.insert(
                "finish_reason".to_string(),
                json!(format!("{:?}", reason).to_lowercase()),
            );
        }

        debug!("Transform returned {} chars", text.len());

        Ok(TransformOutput { text, metadata })
    }
}
