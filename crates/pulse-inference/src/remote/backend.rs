//! Remote classification backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use pulse_core::defaults;
use pulse_core::{BackendError, BackendKind, Error, GenerationBackend, Result};

use super::error::{to_backend_error, RemoteErrorCode};
use super::types::*;

/// Default remote API endpoint.
pub const DEFAULT_REMOTE_URL: &str = defaults::REMOTE_URL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = defaults::REMOTE_MODEL;

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = defaults::REMOTE_TIMEOUT_SECS;

/// Configuration for the remote backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// Bearer credential.
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REMOTE_URL.to_string(),
            api_key: None,
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RemoteConfig {
    /// Create from environment variables.
    ///
    /// The credential is read from `PULSE_REMOTE_API_KEY`, falling back to
    /// `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        let api_key = first_credential([
            std::env::var("PULSE_REMOTE_API_KEY").ok(),
            std::env::var("GEMINI_API_KEY").ok(),
        ]);

        Self {
            base_url: std::env::var("PULSE_REMOTE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_REMOTE_URL.to_string()),
            api_key,
            gen_model: std::env::var("PULSE_REMOTE_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string()),
            timeout_seconds: std::env::var("PULSE_REMOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Whether a usable credential is configured.
    ///
    /// Empty values and sample placeholders (`your_..._here`) do not count.
    pub fn has_valid_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(is_valid_credential)
    }
}

/// First candidate that is a usable credential, trimmed.
///
/// A blank or placeholder value (as left in a sample `config.env`) does not
/// shadow a real key further down the list.
pub fn first_credential<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| is_valid_credential(key))
}

/// Whether `key` looks like a real credential rather than a placeholder.
pub fn is_valid_credential(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() || key == defaults::CREDENTIAL_PLACEHOLDER {
        return false;
    }
    let lowered = key.to_lowercase();
    !(lowered.starts_with("your_") && lowered.ends_with("_here"))
}

/// Remote OpenAI-compatible classification backend.
pub struct RemoteBackend {
    client: Client,
    config: RemoteConfig,
}

impl RemoteBackend {
    /// Create a new remote backend with the given configuration.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "remote",
            url = %config.base_url,
            model = %config.gen_model,
            "Initializing remote backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(RemoteConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key.trim()));
        }

        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl GenerationBackend for RemoteBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "remote", op = "generate", model = %self.config.gen_model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> std::result::Result<String, BackendError> {
        let start = Instant::now();

        let request = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: Some(defaults::TEMPERATURE),
            max_tokens: Some(defaults::MAX_RESPONSE_TOKENS),
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = parse_error_body(&body);
            let class = parsed.as_ref().map(|e| e.class()).unwrap_or("unknown");
            let message = match parsed.as_ref() {
                Some(e) if !e.message.is_empty() => e.message.clone(),
                _ => body.chars().take(300).collect(),
            };
            let code = RemoteErrorCode::from_response(status.as_u16(), class);
            warn!(status = status.as_u16(), ?code, "Remote backend returned error");
            return Err(to_backend_error(code, &message));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Unreachable(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::Unreachable("Response contained no content".to_string()))?;

        debug!(
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(content)
    }

    /// The remote endpoint is not probed; a valid credential is enough.
    async fn health_check(&self) -> Result<bool> {
        Ok(self.config.has_valid_credential())
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }
}
