//! Error types for Precis.

use crate::language::TransformDirective;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Precis operations.
#[derive(Error, Debug)]
pub enum PrecisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transform failed at {stage} ({directive}): {source}")]
    Transform {
        stage: TransformStage,
        directive: TransformDirective,
        #[source]
        source: TransformFailure,
    },

    #[error(
        "Condensation did not converge after {passes} passes \
         (shortest result {best_len} chars, threshold {threshold})"
    )]
    Convergence {
        passes: usize,
        threshold: usize,
        best_len: usize,
        /// Shortest output produced by any pass.
        best_effort: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Text source error: {0}")]
    Source(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl PrecisError {
    /// Index of the chunk whose transform failed, if the failure happened in the map stage.
    pub fn failed_chunk(&self) -> Option<usize> {
        match self {
            PrecisError::Transform {
                stage: TransformStage::Map { chunk_index },
                ..
            } => Some(*chunk_index),
            _ => None,
        }
    }
}

/// Where in the pipeline a transform call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStage {
    /// Per-chunk map call.
    Map { chunk_index: usize },
    /// Hierarchical reduce call.
    Reduce,
}

impl std::fmt::Display for TransformStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformStage::Map { chunk_index } => write!(f, "map stage, chunk {}", chunk_index),
            TransformStage::Reduce => write!(f, "reduce stage"),
        }
    }
}

/// Failure reported by a transform capability for a single call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl TransformFailure {
    /// Whether a bounded retry may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransformFailure::MalformedResponse(_))
    }
}

/// Result type alias for Precis operations.
pub type Result<T> = std::result::Result<T, PrecisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_chunk_only_for_map_stage() {
        let err = PrecisError::Transform {
            stage: TransformStage::Map { chunk_index: 3 },
            directive: TransformDirective::OriginalLanguage,
            source: TransformFailure::Transport("connection reset".to_string()),
        };
        assert_eq!(err.failed_chunk(), Some(3));
        assert!(err.to_string().contains("chunk 3"));

        let err = PrecisError::Transform {
            stage: TransformStage::Reduce,
            directive: TransformDirective::OriginalLanguage,
            source: TransformFailure::Timeout(Duration::from_secs(5)),
        };
        assert_eq!(err.failed_chunk(), None);
    }

    #[test]
    fn test_malformed_response_is_not_retryable() {
        assert!(TransformFailure::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(TransformFailure::RateLimited("slow down".into()).is_retryable());
        assert!(!TransformFailure::MalformedResponse("no choices".into()).is_retryable());
    }
}
