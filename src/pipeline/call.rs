//! One transform call with a timeout, bounded retries and cancellation.

use crate::config::TransformSettings;
use crate::error::{PrecisError, Result, TransformFailure, TransformStage};
use crate::language::TransformDirective;
use crate::transform::{TransformCapability, TransformOutput};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// How a single transform call is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPolicy {
    /// Per-call timeout. None = wait as long as the backend does.
    pub timeout: Option<Duration>,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Wait before the first retry, doubled for each further retry.
    pub backoff: Duration,
}

impl CallPolicy {
    pub fn from_settings(settings: &TransformSettings) -> Self {
        Self {
            timeout: Some(Duration::from_secs(settings.timeout_seconds)),
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    /// A single attempt with no timeout.
    pub fn once() -> Self {
        Self {
            timeout: None,
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::from_settings(&TransformSettings::default())
    }
}

/// Invoke the capability for one prompt.
///
/// Retryable failures are retried up to `policy.max_retries` times. The final
/// failure is reported with the stage and directive it happened under.
pub(crate) async fn invoke(
    transform: &dyn TransformCapability,
    prompt: &str,
    policy: &CallPolicy,
    cancel: &CancellationToken,
    stage: TransformStage,
    directive: &TransformDirective,
) -> Result<TransformOutput> {
    let mut attempt = 0;

    loop {
        let call = async {
            match policy.timeout {
                Some(limit) => tokio::time::timeout(limit, transform.invoke(prompt))
                    .await
                    .unwrap_or(Err(TransformFailure::Timeout(limit))),
                None => transform.invoke(prompt).await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PrecisError::Cancelled),
            result = call => result,
        };

        match result {
            Ok(output) => return Ok(output),
            Err(failure) if failure.is_retryable() && attempt < policy.max_retries => {
                let wait = policy.backoff_for(attempt);
                attempt += 1;
                warn!(
                    "Transform call failed at {} ({}), retry {}/{} in {:?}",
                    stage, failure, attempt, policy.max_retries, wait
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(PrecisError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }
            }
            Err(failure) => {
                return Err(PrecisError::Transform {
                    stage,
                    directive: directive.clone(),
                    source: failure,
                })
            }
        }
    }
}
