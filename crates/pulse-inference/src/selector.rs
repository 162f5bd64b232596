//! Per-run backend selection with per-call fallback.
//!
//! The selector probes once per run. Local inference is preferred when the
//! server is reachable and has the model; a configured remote credential is
//! the next choice; with neither, the run proceeds in search-only mode.
//!
//! Fallback is decided per call and is not sticky: a local failure retries
//! the same prompt on remote, but the next call starts at local again.
//!
//! Log fields use the names listed in [`pulse_core::logging`].

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use pulse_core::{BackendError, BackendKind, GenerationBackend};

/// Result of one batch call through the selector.
#[derive(Debug, Clone)]
pub struct BatchCallOutcome {
    /// Backend whose answer (or failure) is reported; `None` when no
    /// backend was available.
    pub backend_used: Option<BackendKind>,
    pub result: Result<String, BackendError>,
}

impl BatchCallOutcome {
    fn no_backend() -> Self {
        Self {
            backend_used: None,
            result: Err(BackendError::NoBackend),
        }
    }
}

/// Backend routing for a single run.
#[derive(Clone)]
pub struct BackendSelector {
    primary: Option<Arc<dyn GenerationBackend>>,
    fallback: Option<Arc<dyn GenerationBackend>>,
}

impl std::fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSelector")
            .field("primary", &self.primary())
            .field("fallback", &self.fallback.as_ref().map(|b| b.kind()))
            .finish()
    }
}

impl BackendSelector {
    /// Probe the configured backends and fix the primary for this run.
    #[instrument(skip_all, fields(subsystem = "inference", component = "selector", op = "probe"))]
    pub async fn probe(
        local: Option<Arc<dyn GenerationBackend>>,
        remote: Option<Arc<dyn GenerationBackend>>,
    ) -> Self {
        let start = Instant::now();

        let remote = match remote {
            Some(backend) => match backend.health_check().await {
                Ok(true) => Some(backend),
                Ok(false) => {
                    debug!("Remote credential missing or placeholder");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Remote health check failed");
                    None
                }
            },
            None => None,
        };

        let local = match local {
            Some(backend) => match backend.health_check().await {
                Ok(true) => Some(backend),
                Ok(false) => None,
                Err(e) => {
                    warn!(error = %e, "Local health check failed");
                    None
                }
            },
            None => None,
        };

        let selector = match (local, remote) {
            (Some(local), remote) => Self {
                primary: Some(local),
                fallback: remote,
            },
            (None, Some(remote)) => Self {
                primary: Some(remote),
                fallback: None,
            },
            (None, None) => Self {
                primary: None,
                fallback: None,
            },
        };

        match &selector.primary {
            Some(backend) => info!(
                backend = %backend.kind(),
                model = backend.model_name(),
                has_fallback = selector.fallback.is_some(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Backend selected"
            ),
            None => warn!(
                duration_ms = start.elapsed().as_millis() as u64,
                "No classification backend available, running in search-only mode"
            ),
        }

        selector
    }

    /// Selector with no backend (search-only mode).
    pub fn none() -> Self {
        Self {
            primary: None,
            fallback: None,
        }
    }

    /// Kind of the primary backend, if any.
    pub fn primary(&self) -> Option<BackendKind> {
        self.primary.as_ref().map(|b| b.kind())
    }

    /// Whether any backend is available.
    pub fn has_backend(&self) -> bool {
        self.primary.is_some()
    }

    /// Label recorded in dataset meta: "local", "remote" or "none".
    pub fn label(&self) -> String {
        self.primary()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "none".to_string())
    }

    /// Send a classification prompt, falling back to remote on failure.
    pub async fn classify_batch(&self, prompt: &str) -> BatchCallOutcome {
        self.route(prompt, "classify_batch").await
    }

    /// Send a digest prompt with the same routing as batch calls.
    pub async fn generate_digest(&self, prompt: &str) -> BatchCallOutcome {
        self.route(prompt, "generate_digest").await
    }

    async fn route(&self, prompt: &str, op: &'static str) -> BatchCallOutcome {
        let Some(primary) = &self.primary else {
            return BatchCallOutcome::no_backend();
        };

        let result = primary.generate(prompt).await;
        let primary_err = match result {
            Ok(text) => {
                return BatchCallOutcome {
                    backend_used: Some(primary.kind()),
                    result: Ok(text),
                }
            }
            Err(e) => e,
        };

        match &self.fallback {
            Some(fallback) => {
                warn!(
                    subsystem = "inference",
                    component = "selector",
                    op,
                    backend = %primary.kind(),
                    error = %primary_err,
                    "Primary backend failed, retrying on {}",
                    fallback.kind()
                );
                BatchCallOutcome {
                    backend_used: Some(fallback.kind()),
                    result: fallback.generate(prompt).await,
                }
            }
            None => BatchCallOutcome {
                backend_used: Some(primary.kind()),
                result: Err(primary_err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    fn arc(backend: &MockBackend) -> Option<Arc<dyn GenerationBackend>> {
        Some(Arc::new(backend.clone()))
    }

    // ==========================================================================
    // Probe
    // ==========================================================================

    #[tokio::test]
    async fn test_probe_prefers_local() {
        let local = MockBackend::new(BackendKind::Local);
        let remote = MockBackend::new(BackendKind::Remote);
        let selector = BackendSelector::probe(arc(&local), arc(&remote)).await;
        assert_eq!(selector.primary(), Some(BackendKind::Local));
        assert_eq!(selector.label(), "local");
    }

    #[tokio::test]
    async fn test_probe_falls_to_remote() {
        let local = MockBackend::new(BackendKind::Local).with_health(false);
        let remote = MockBackend::new(BackendKind::Remote);
        let selector = BackendSelector::probe(arc(&local), arc(&remote)).await;
        assert_eq!(selector.primary(), Some(BackendKind::Remote));
    }

    #[tokio::test]
    async fn test_probe_none() {
        let local = MockBackend::new(BackendKind::Local).with_health(false);
        let remote = MockBackend::new(BackendKind::Remote).with_health(false);
        let selector = BackendSelector::probe(arc(&local), arc(&remote)).await;
        assert!(!selector.has_backend());
        assert_eq!(selector.label(), "none");

        let outcome = selector.classify_batch("x").await;
        assert_eq!(outcome.backend_used, None);
        assert_eq!(outcome.result, Err(BackendError::NoBackend));
    }

    // ==========================================================================
    // Routing
    // ==========================================================================

    #[tokio::test]
    async fn test_local_failure_falls_back_per_call() {
        let local = MockBackend::new(BackendKind::Local)
            .with_fixed_response("local ok")
            .with_script(vec![Err(BackendError::Unreachable("timeout".into()))]);
        let remote = MockBackend::new(BackendKind::Remote).with_fixed_response("remote ok");
        let selector = BackendSelector::probe(arc(&local), arc(&remote)).await;

        let first = selector.classify_batch("p1").await;
        assert_eq!(first.backend_used, Some(BackendKind::Remote));
        assert_eq!(first.result.as_deref(), Ok("remote ok"));

        let second = selector.classify_batch("p2").await;
        assert_eq!(second.backend_used, Some(BackendKind::Local));
        assert_eq!(second.result.as_deref(), Ok("local ok"));

        assert_eq!(local.call_count(), 2);
        assert_eq!(remote.call_count(), 1);
        assert_eq!(remote.calls()[0].prompt, "p1");
    }

    #[tokio::test]
    async fn test_remote_primary_has_no_fallback() {
        let remote = MockBackend::new(BackendKind::Remote)
            .with_failure(BackendError::RateLimited("429".into()));
        let selector = BackendSelector::probe(None, arc(&remote)).await;

        let outcome = selector.classify_batch("p").await;
        assert_eq!(outcome.backend_used, Some(BackendKind::Remote));
        assert!(outcome.result.unwrap_err().is_rate_limited());
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn test_local_failure_without_remote() {
        let local = MockBackend::new(BackendKind::Local)
            .with_failure(BackendError::Unreachable("down".into()));
        let selector = BackendSelector::probe(arc(&local), None).await;

        let outcome = selector.generate_digest("digest").await;
        assert_eq!(outcome.backend_used, Some(BackendKind::Local));
        assert!(matches!(outcome.result, Err(BackendError::Unreachable(_))));
    }
}
