//! Ollama (local) classification backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pulse_core::defaults;
use pulse_core::{BackendError, BackendKind, Error, GenerationBackend, Result};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = defaults::OLLAMA_URL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = defaults::LOCAL_MODEL;

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = defaults::LOCAL_TIMEOUT_SECS;

/// Configuration for the local Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub gen_model: String,
    /// Generation request timeout in seconds.
    pub timeout_seconds: u64,
    /// Availability probe timeout in seconds.
    pub probe_timeout_seconds: u64,
    /// Attempts per generation call.
    pub retries: u32,
    /// Wait before retry `n` is `retry_base_seconds * n`.
    pub retry_base_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            timeout_seconds: GEN_TIMEOUT_SECS,
            probe_timeout_seconds: defaults::PROBE_TIMEOUT_SECS,
            retries: defaults::LOCAL_RETRIES,
            retry_base_seconds: defaults::LOCAL_RETRY_BASE_SECS,
        }
    }
}

impl OllamaConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: std::env::var("OLLAMA_BASE").unwrap_or(base.base_url),
            gen_model: std::env::var("OLLAMA_GEN_MODEL").unwrap_or(base.gen_model),
            timeout_seconds: std::env::var("PULSE_LOCAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(base.timeout_seconds),
            ..base
        }
    }
}

/// Whether `wanted` is among `available`, exactly or by family prefix.
///
/// `llama3.2:3b` is satisfied by `llama3.2:3b` or any other `llama3.2:` tag.
pub fn model_available(wanted: &str, available: &[String]) -> bool {
    let family = wanted.split(':').next().unwrap_or(wanted);
    let prefix = format!("{}:", family);
    available
        .iter()
        .any(|name| name == wanted || name.starts_with(&prefix))
}

/// Ollama classification backend.
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    /// Create a new Ollama backend with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "ollama",
            url = %config.base_url,
            model = %config.gen_model,
            "Initializing Ollama backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> std::result::Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.config.base_url))
            .timeout(Duration::from_secs(self.config.probe_timeout_seconds))
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BackendError::Unreachable(format!(
                "Ollama returned {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Unreachable(format!("Failed to parse tags: {}", e)))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate_once(&self, prompt: &str) -> std::result::Result<String, BackendError> {
        let request = GenerateRequest {
            model: self.config.gen_model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: defaults::TEMPERATURE,
                num_predict: defaults::MAX_RESPONSE_TOKENS,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Unreachable(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Unreachable(format!("Failed to parse response: {}", e)))?;
        Ok(result.response)
    }
}

/// Request payload for the Ollama `/api/generate` endpoint.
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response from the Ollama `/api/generate` endpoint.
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Response from the Ollama `/api/tags` endpoint.
#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "ollama", op = "generate", model = %self.config.gen_model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> std::result::Result<String, BackendError> {
        let start = Instant::now();
        let attempts = self.config.retries.max(1);
        let mut last_err = BackendError::Unreachable("no attempt made".to_string());

        for attempt in 1..=attempts {
            match self.generate_once(prompt).await {
                Ok(content) => {
                    let elapsed = start.elapsed().as_millis() as u64;
                    debug!(
                        response_len = content.len(),
                        duration_ms = elapsed,
                        attempt,
                        "Generation complete"
                    );
                    if elapsed > 60_000 {
                        warn!(duration_ms = elapsed, slow = true, "Slow generation operation");
                    }
                    return Ok(content);
                }
                Err(e) => {
                    let wait = self.config.retry_base_seconds * u64::from(attempt);
                    warn!(
                        attempt,
                        attempts,
                        wait_secs = wait,
                        error = %e,
                        "Ollama attempt failed"
                    );
                    last_err = e;
                    if attempt < attempts && wait > 0 {
                        tokio::time::sleep(Duration::from_secs(wait)).await;
                    }
                }
            }
        }

        Err(BackendError::Unreachable(format!(
            "all {} attempts failed, last error: {}",
            attempts, last_err
        )))
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(models) => {
                if model_available(&self.config.gen_model, &models) {
                    info!(model = %self.config.gen_model, "Ollama health check passed");
                    Ok(true)
                } else {
                    warn!(
                        model = %self.config.gen_model,
                        available = ?models,
                        "Ollama running but model not found; run `ollama pull {}`",
                        self.config.gen_model
                    );
                    Ok(false)
                }
            }
            Err(e) => {
                warn!(error = %e, "Ollama health check error");
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Constants Tests
    // ==========================================================================

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_OLLAMA_URL, "http://127.0.0.1:11434");
        assert_eq!(DEFAULT_GEN_MODEL, "llama3.2:3b");
        assert_eq!(GEN_TIMEOUT_SECS, 180);
    }

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.retries, 3);
        assert_eq!(config.retry_base_seconds, 5);
        assert_eq!(config.probe_timeout_seconds, 5);
    }

    // ==========================================================================
    // Model Matching Tests
    // ==========================================================================

    #[test]
    fn test_model_available_exact() {
        let models = vec!["llama3.2:3b".to_string()];
        assert!(model_available("llama3.2:3b", &models));
    }

    #[test]
    fn test_model_available_family_prefix() {
        let models = vec!["nomic-embed-text:latest".to_string(), "llama3.2:1b".to_string()];
        assert!(model_available("llama3.2:3b", &models));
    }

    #[test]
    fn test_model_not_available() {
        let models = vec!["llama3.1:8b".to_string(), "llama3.2-vision:11b".to_string()];
        assert!(!model_available("llama3.2:3b", &models));
        assert!(!model_available("llama3.2:3b", &[]));
    }

    #[test]
    fn test_backend_reports_kind_and_model() {
        let backend = OllamaBackend::new(OllamaConfig::default()).unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);
        assert_eq!(backend.model_name(), "llama3.2:3b");
    }
}
