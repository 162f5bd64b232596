//! Scripted classification backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_inference::mock::MockBackend;
//! use pulse_core::{BackendError, BackendKind};
//!
//! let backend = MockBackend::new(BackendKind::Local)
//!     .with_script(vec![
//!         Err(BackendError::RateLimited("429".into())),
//!         Ok(r#"[{"relevance": 9}]"#.into()),
//!     ]);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use pulse_core::{BackendError, BackendKind, GenerationBackend, Result};

use crate::prompt::count_prompt_records;

/// Scripted backend with a call log.
#[derive(Clone)]
pub struct MockBackend {
    config: Arc<MockConfig>,
    script: Arc<Mutex<VecDeque<std::result::Result<String, BackendError>>>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    kind: BackendKind,
    model: String,
    healthy: bool,
    default_response: DefaultResponse,
    latency_ms: u64,
}

#[derive(Debug, Clone)]
enum DefaultResponse {
    Fixed(String),
    Uniform(JsonValue),
    Fail(BackendError),
}

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub at: tokio::time::Instant,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockBackend {
    /// Healthy backend answering `[]` unless scripted otherwise.
    pub fn new(kind: BackendKind) -> Self {
        Self {
            config: Arc::new(MockConfig {
                kind,
                model: format!("mock-{}", kind),
                healthy: true,
                default_response: DefaultResponse::Fixed("[]".to_string()),
                latency_ms: 0,
            }),
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the health-check result.
    pub fn with_health(mut self, healthy: bool) -> Self {
        Arc::make_mut(&mut self.config).healthy = healthy;
        self
    }

    /// Answer every unscripted call with `response`.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = DefaultResponse::Fixed(response.into());
        self
    }

    /// Answer every unscripted call with an array holding one copy of
    /// `item` per record in the prompt.
    pub fn with_uniform_classification(mut self, item: JsonValue) -> Self {
        Arc::make_mut(&mut self.config).default_response = DefaultResponse::Uniform(item);
        self
    }

    /// Fail every unscripted call with `error`.
    pub fn with_failure(mut self, error: BackendError) -> Self {
        Arc::make_mut(&mut self.config).default_response = DefaultResponse::Fail(error);
        self
    }

    /// Queue outcomes consumed in order before the default applies.
    pub fn with_script(self, outcomes: Vec<std::result::Result<String, BackendError>>) -> Self {
        lock(&self.script).extend(outcomes);
        self
    }

    /// Simulated latency per call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// All logged calls, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    /// Number of `generate` calls made.
    pub fn call_count(&self) -> usize {
        lock(&self.call_log).len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        lock(&self.call_log).clear()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, BackendError> {
        lock(&self.call_log).push(MockCall {
            prompt: prompt.to_string(),
            at: tokio::time::Instant::now(),
        });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(outcome) = lock(&self.script).pop_front() {
            return outcome;
        }

        match &self.config.default_response {
            DefaultResponse::Fixed(text) => Ok(text.clone()),
            DefaultResponse::Uniform(item) => {
                let n = count_prompt_records(prompt);
                Ok(JsonValue::Array(vec![item.clone(); n]).to_string())
            }
            DefaultResponse::Fail(err) => Err(err.clone()),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.config.healthy)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn kind(&self) -> BackendKind {
        self.config.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_script_then_default() {
        let backend = MockBackend::new(BackendKind::Remote)
            .with_fixed_response("done")
            .with_script(vec![Err(BackendError::RateLimited("429".into()))]);

        assert!(backend.generate("a").await.unwrap_err().is_rate_limited());
        assert_eq!(backend.generate("b").await.unwrap(), "done");
        assert_eq!(backend.call_count(), 2);
        assert_eq!(backend.calls()[1].prompt, "b");
    }

    #[tokio::test]
    async fn test_uniform_classification_matches_record_count() {
        let backend = MockBackend::new(BackendKind::Local)
            .with_uniform_classification(json!({"relevance": 9}));
        let prompt = "1. [platform=reddit] \"\"\"a\"\"\"\n2. [platform=twitter] \"\"\"b\"\"\"";
        let out: JsonValue = serde_json::from_str(&backend.generate(prompt).await.unwrap()).unwrap();
        assert_eq!(out.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_health_and_identity() {
        let backend = MockBackend::new(BackendKind::Local).with_health(false);
        assert!(!backend.health_check().await.unwrap());
        assert_eq!(backend.kind(), BackendKind::Local);
        assert_eq!(backend.model_name(), "mock-local");
    }

    #[tokio::test]
    async fn test_clones_share_call_log() {
        let backend = MockBackend::new(BackendKind::Local);
        let clone = backend.clone();
        clone.generate("x").await.unwrap();
        assert_eq!(backend.call_count(), 1);
        backend.clear_calls();
        assert_eq!(clone.call_count(), 0);
    }
}
