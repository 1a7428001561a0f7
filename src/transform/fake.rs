//! Scripted transform capability for tests.

use super::{TransformCapability, TransformOutput};
use crate::error::TransformFailure;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&str) -> Result<String, TransformFailure> + Send + Sync>;
type Delay = Box<dyn Fn(&str) -> Duration + Send + Sync>;

/// Answers prompts with a closure and records every prompt it receives.
pub(crate) struct FakeTransformer {
    respond: Responder,
    delay: Option<Delay>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransformer {
    pub fn new(
        respond: impl Fn(&str) -> Result<String, TransformFailure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Wait before answering, per prompt.
    pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TransformCapability for FakeTransformer {
    async fn invoke(&self, prompt: &str) -> Result<TransformOutput, TransformFailure> {
        self.calls.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(prompt)).await;
        }

        let text = (self.respond)(prompt)?;
        let mut output = TransformOutput::new(text);
        output
            .metadata
            .insert("prompt_chars".to_string(), json!(prompt.chars().count()));
        Ok(output)
    }
}

/// Text between the first `open` and the following `close`.
pub(crate) fn between<'a>(prompt: &'a str, open: &str, close: &str) -> &'a str {
    let start = prompt.find(open).map(|i| i + open.len()).unwrap_or(0);
    let end = prompt[start..]
        .find(close)
        .map(|i| start + i)
        .unwrap_or(prompt.len());
    &prompt[start..end]
}
