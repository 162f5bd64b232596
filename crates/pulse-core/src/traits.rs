//! Core traits for mention-pulse abstractions.
//!
//! These traits define the interfaces that concrete backends must satisfy,
//! enabling pluggable inference providers and scripted test doubles.

use async_trait::async_trait;

use crate::error::{BackendError, Result};
use crate::models::BackendKind;

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for text generation (LLM) used for batch classification and digests.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for a prompt.
    ///
    /// Failures are reported as [`BackendError`] values for the caller to
    /// route; implementations never panic on transport errors.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, BackendError>;

    /// Check if the backend is available and ready to serve its model.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;

    /// Backend family, reported in outputs and logs.
    fn kind(&self) -> BackendKind;
}
