//! Remote OpenAI-compatible classification backend.
//!
//! Works with any endpoint that speaks the chat-completions protocol with a
//! bearer credential. The default target is Gemini's OpenAI-compatible
//! surface.
//!
//! # Example
//!
//! ```rust,no_run
//! use pulse_inference::remote::{RemoteBackend, RemoteConfig};
//! use pulse_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RemoteConfig {
//!         api_key: Some("sk-...".to_string()),
//!         ..RemoteConfig::default()
//!     };
//!     let backend = RemoteBackend::new(config).unwrap();
//!     let text = backend.generate("Classify: ...").await;
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{
    is_valid_credential, RemoteBackend, RemoteConfig, DEFAULT_GEN_MODEL, DEFAULT_REMOTE_URL,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{to_backend_error, RemoteErrorCode};
pub use types::*;
