//! Configuration settings for Precis.

use crate::error::{PrecisError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub transform: TransformSettings,
    pub chunking: ChunkingSettings,
    pub condensation: CondensationSettings,
    pub language: LanguageSettings,
    pub source: SourceSettings,
    pub prompts: PromptSettings,
}

/// Settings for the text transform backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Chat model used for every transform call.
    pub model: String,
    /// OpenAI-compatible endpoint. None = official API.
    pub api_base: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum concurrent transform calls in the map stage.
    pub max_concurrent: usize,
    /// Retries after a failed call (timeouts, rate limits, transport errors).
    pub max_retries: u32,
    /// Initial backoff between retries, doubled on each attempt.
    pub retry_backoff_ms: u64,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            temperature: 0.3,
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
            max_concurrent: 4,
            max_retries: 2,
            retry_backoff_ms: 1000,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Characters the transform backend accepts per request, prompt included.
    pub context_max_chars: usize,
    /// Characters shared between consecutive chunks. None = a quarter of the chunk size.
    pub overlap: Option<usize>,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            context_max_chars: 12_000,
            overlap: None,
        }
    }
}

/// Settings for repeated condensation of bullet lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CondensationSettings {
    /// Target length in characters. None = `chunking.context_max_chars`.
    pub threshold: Option<usize>,
    /// Maximum number of passes, the first included.
    pub max_passes: usize,
    /// Print the shortest result when the loop gives up instead of failing.
    pub accept_best_effort: bool,
}

impl Default for CondensationSettings {
    fn default() -> Self {
        Self {
            threshold: None,
            max_passes: 5,
            accept_best_effort: true,
        }
    }
}

/// Output language settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LanguageSettings {
    /// Language code to reply in. None = keep the source language.
    pub forced_code: Option<String>,
}

/// Input loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Model used to transcribe audio files.
    pub transcription_model: String,
    /// Timeout for fetching web pages.
    pub http_timeout_seconds: u64,
    /// Below this share of punctuation characters a text counts as unpunctuated.
    pub min_punctuation_percent: f64,
    /// Restore punctuation before processing unpunctuated texts.
    pub restore_punctuation: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            transcription_model: "whisper-1".to_string(),
            http_timeout_seconds: 30,
            min_punctuation_percent: 1.0,
            restore_punctuation: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PrecisError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("precis")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Target length for condensed bullet lists.
    pub fn condensation_threshold(&self) -> usize {
        self.condensation
            .threshold
            .unwrap_or(self.chunking.context_max_chars)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.context_max_chars == 0 {
            return Err(PrecisError::Config(
                "chunking.context_max_chars must be greater than zero".to_string(),
            ));
        }
        if self.transform.max_concurrent == 0 {
            return Err(PrecisError::Config(
                "transform.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.transform.timeout_seconds == 0 {
            return Err(PrecisError::Config(
                "transform.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.condensation.max_passes == 0 {
            return Err(PrecisError::Config(
                "condensation.max_passes must be at least 1".to_string(),
            ));
        }
        if self.condensation_threshold() == 0 {
            return Err(PrecisError::Config(
                "condensation.threshold must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.source.min_punctuation_percent) {
            return Err(PrecisError::Config(format!(
                "source.min_punctuation_percent must be between 0 and 100, got {}",
                self.source.min_punctuation_percent
            )));
        }
        Ok(())
    }
}
