//! # pulse-inference
//!
//! Classification backends for mention-pulse.
//!
//! This crate provides:
//! - Ollama local backend with model probing and bounded retries
//! - Remote OpenAI-compatible backend (Gemini by default)
//! - Per-run backend selection with per-call fallback
//! - Batch and digest prompt construction
//! - Recovery of classifications from malformed model output
//! - Scripted mock backend (feature `mock`)
//!
//! # Feature Flags
//!
//! - `mock`: Expose [`mock::MockBackend`] to downstream tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pulse_inference::{BackendSelector, OllamaBackend, RemoteBackend};
//! use pulse_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let local: Arc<dyn GenerationBackend> = Arc::new(OllamaBackend::from_env().unwrap());
//!     let remote: Arc<dyn GenerationBackend> = Arc::new(RemoteBackend::from_env().unwrap());
//!     let selector = BackendSelector::probe(Some(local), Some(remote)).await;
//!     let outcome = selector.classify_batch("1. [platform=reddit] \"\"\"hi\"\"\"").await;
//!     println!("{:?}", outcome.backend_used);
//! }
//! ```

pub mod ollama;
pub mod prompt;
pub mod recovery;
pub mod remote;
pub mod selector;

// Scripted backend for deterministic testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use ollama::{model_available, OllamaBackend, OllamaConfig};
pub use prompt::{build_batch_prompt, build_digest_prompt, count_prompt_records, BrandContext};
pub use recovery::{parse_batch_response, strip_fences, RecoveredBatch, RecoveryLevel};
pub use remote::{is_valid_credential, RemoteBackend, RemoteConfig};
pub use selector::{BackendSelector, BatchCallOutcome};
