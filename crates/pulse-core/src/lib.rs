//! # pulse-core
//!
//! Core types, traits, and abstractions for mention-pulse.
//!
//! This crate provides the data model shared by the search, inference and
//! pipeline crates: mentions and their enrichment, datasets, checkpoints,
//! the error taxonomy, shared defaults, and structured-logging field names.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{BackendError, Error, Result};
pub use models::*;
pub use traits::*;
