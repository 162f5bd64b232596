//! Error types for mention-pulse.

use thiserror::Error;

/// Result type alias using mention-pulse's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mention-pulse operations.
///
/// Only [`Error::CheckpointPersistence`], [`Error::InvalidDataset`],
/// [`Error::RunLocked`] and configuration/I/O failures terminate a run.
/// Record-level failures are counted and dropped; backend failures travel
/// as [`BackendError`] and never become an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// A raw record lacked an id, platform tag or timestamp
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// The checkpoint could not be durably written
    #[error("Checkpoint persistence failed: {0}")]
    CheckpointPersistence(String),

    /// A source or prior dataset is missing or unreadable
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Another run holds the data directory lock
    #[error("Run locked: {0}")]
    RunLocked(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Failure of a single classification call.
///
/// Carried inside a batch call outcome rather than propagated, so the batch
/// engine decides what happens next.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Network error, timeout, non-success status or unusable payload.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with a rate-limit response (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// No backend is configured for this call.
    #[error("no backend available")]
    NoBackend,
}

impl BackendError {
    /// Whether this failure is a rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_malformed_record() {
        let err = Error::MalformedRecord("missing id".to_string());
        assert_eq!(err.to_string(), "Malformed record: missing id");
    }

    #[test]
    fn test_error_display_checkpoint() {
        let err = Error::CheckpointPersistence("disk full".to_string());
        assert_eq!(err.to_string(), "Checkpoint persistence failed: disk full");
    }

    #[test]
    fn test_error_display_invalid_dataset() {
        let err = Error::InvalidDataset("reddit_raw.json".to_string());
        assert_eq!(err.to_string(), "Invalid dataset: reddit_raw.json");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_backend_error_rate_limited() {
        assert!(BackendError::RateLimited("429".into()).is_rate_limited());
        assert!(!BackendError::Unreachable("timeout".into()).is_rate_limited());
        assert!(!BackendError::NoBackend.is_rate_limited());
    }

    #[test]
    fn test_backend_error_display() {
        assert_eq!(
            BackendError::Unreachable("timeout".into()).to_string(),
            "backend unreachable: timeout"
        );
        assert_eq!(BackendError::NoBackend.to_string(), "no backend available");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
        assert_send::<BackendError>();
        assert_sync::<BackendError>();
    }
}
