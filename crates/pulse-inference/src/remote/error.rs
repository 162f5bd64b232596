//! Remote API error classification.

use pulse_core::BackendError;

/// Error classes reported by OpenAI-compatible endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl RemoteErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) | (_, "RESOURCE_EXHAUSTED") => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert a remote error into the per-call backend error.
///
/// Only rate limits are distinguished; everything else means the backend
/// could not serve this call.
pub fn to_backend_error(code: RemoteErrorCode, message: &str) -> BackendError {
    match code {
        RemoteErrorCode::RateLimitExceeded => {
            BackendError::RateLimited(format!("Rate limit exceeded: {}", message))
        }
        RemoteErrorCode::AuthenticationError => {
            BackendError::Unreachable(format!("Authentication failed: {}", message))
        }
        RemoteErrorCode::ModelNotFound => {
            BackendError::Unreachable(format!("Model not found: {}", message))
        }
        RemoteErrorCode::ContextLengthExceeded => {
            BackendError::Unreachable(format!("Context too long: {}", message))
        }
        RemoteErrorCode::ServerError => {
            BackendError::Unreachable(format!("Server error: {}", message))
        }
        RemoteErrorCode::Unknown => BackendError::Unreachable(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_401() {
        let code = RemoteErrorCode::from_response(401, "invalid_api_key");
        assert_eq!(code, RemoteErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_429() {
        let code = RemoteErrorCode::from_response(429, "rate_limit_exceeded");
        assert_eq!(code, RemoteErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_error_code_resource_exhausted() {
        let code = RemoteErrorCode::from_response(400, "RESOURCE_EXHAUSTED");
        assert_eq!(code, RemoteErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_error_code_from_500() {
        let code = RemoteErrorCode::from_response(503, "unavailable");
        assert_eq!(code, RemoteErrorCode::ServerError);
    }

    #[test]
    fn test_error_code_from_unknown() {
        let code = RemoteErrorCode::from_response(418, "im_a_teapot");
        assert_eq!(code, RemoteErrorCode::Unknown);
    }

    #[test]
    fn test_rate_limit_maps_to_rate_limited() {
        let err = to_backend_error(RemoteErrorCode::RateLimitExceeded, "quota");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_other_codes_map_to_unreachable() {
        for code in [
            RemoteErrorCode::AuthenticationError,
            RemoteErrorCode::ModelNotFound,
            RemoteErrorCode::ServerError,
            RemoteErrorCode::Unknown,
        ] {
            assert!(matches!(
                to_backend_error(code, "x"),
                BackendError::Unreachable(_)
            ));
        }
    }
}
