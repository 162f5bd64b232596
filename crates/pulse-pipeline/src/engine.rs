//! Checkpointed batch enrichment engine.
//!
//! Each batch moves through `Pending -> Sent -> ParsedOrRecovered ->
//! Validated -> Committed`. A rate-limited call waits and is resent; a batch
//! that cannot be classified still commits, with default-filled
//! enrichment. The checkpoint is written after every commit and before the
//! next batch is sent, so a restart never resends committed work.
//!
//! Log fields use the names listed in [`pulse_core::logging`].

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use pulse_core::defaults;
use pulse_core::{BackendError, BackendKind, Checkpoint, Enrichment, Mention, MentionKey, Result};
use pulse_inference::{build_batch_prompt, parse_batch_response, BackendSelector, BrandContext};

use crate::checkpoint::{run_scope_id, CheckpointStore};

/// Capacity of the engine event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Records per batch.
    pub batch_size: usize,
    /// Pause between successive batch calls.
    pub inter_batch_delay: Duration,
    /// Wait before resending after the n-th rate-limit response. One more
    /// rate limit than there are entries fails the batch.
    pub rate_limit_backoff: Vec<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            inter_batch_delay: Duration::from_millis(defaults::INTER_BATCH_DELAY_MS),
            rate_limit_backoff: defaults::RATE_LIMIT_BACKOFF_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        }
    }
}

impl EngineConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }
}

/// Lifecycle state of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Sent,
    /// Sent and refused; `hits` rate limits seen so far.
    RateLimited { hits: usize },
    ParsedOrRecovered,
    Validated,
    Committed,
    Failed(BatchFailure),
}

/// Why a batch committed default-filled enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchFailure {
    Unreachable(String),
    RateLimit,
}

impl std::fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable(msg) => write!(f, "unreachable: {}", msg),
            Self::RateLimit => write!(f, "rate limit retries exhausted"),
        }
    }
}

/// Progress event emitted by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A run began; `resumed_batches` were restored from a checkpoint.
    RunStarted {
        run_scope_id: String,
        batch_total: usize,
        resumed_batches: usize,
    },
    /// A batch was refused with a rate limit and will be resent.
    BatchRateLimited {
        batch_index: usize,
        hits: usize,
        wait: Duration,
    },
    /// A batch committed classifications from a backend.
    BatchCommitted {
        batch_index: usize,
        backend: Option<BackendKind>,
        recovery_level: u8,
    },
    /// A batch committed default-filled enrichment.
    BatchFailed {
        batch_index: usize,
        failure: BatchFailure,
    },
    /// Every batch committed and the checkpoint was cleared.
    RunCompleted { committed: usize },
}

/// Result of an engine run.
#[derive(Debug, Clone, Default)]
pub struct EngineReport {
    pub run_scope_id: String,
    /// Enriched mentions, in input order.
    pub committed: Vec<Mention>,
    pub batches_sent: usize,
    pub batches_resumed: usize,
    pub batches_failed: usize,
    /// Mentions reused from a checkpoint of a different scope.
    pub salvaged: usize,
}

struct BatchResult {
    mentions: Vec<Mention>,
    outcome: std::result::Result<(Option<BackendKind>, u8), BatchFailure>,
}

/// Drives classification of a run's `to_enrich` set.
pub struct BatchEngine {
    selector: BackendSelector,
    brand: BrandContext,
    config: EngineConfig,
    checkpoints: CheckpointStore,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl BatchEngine {
    pub fn new(
        selector: BackendSelector,
        brand: BrandContext,
        config: EngineConfig,
        checkpoints: CheckpointStore,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            selector,
            brand,
            config,
            checkpoints,
            event_tx,
        }
    }

    /// Subscribe to progress events.
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Enrich `to_enrich`, resuming from a matching checkpoint.
    ///
    /// Returns the enriched mentions in input order. Fails only when the
    /// checkpoint cannot be written; the checkpoint on disk then still
    /// describes every committed batch.
    pub async fn run(&self, to_enrich: Vec<Mention>) -> Result<EngineReport> {
        let start = Instant::now();

        if !self.selector.has_backend() {
            info!(
                subsystem = "pipeline",
                component = "engine",
                record_count = to_enrich.len(),
                "No backend available, skipping enrichment"
            );
            return Ok(EngineReport::default());
        }

        if to_enrich.is_empty() {
            self.checkpoints.clear()?;
            info!(subsystem = "pipeline", component = "engine", "Nothing to enrich");
            return Ok(EngineReport::default());
        }

        let (checkpoint, remaining, salvaged) = self.restore(&to_enrich);
        let mut checkpoint = checkpoint;
        let mut report = EngineReport {
            run_scope_id: checkpoint.run_scope_id.clone(),
            salvaged,
            ..EngineReport::default()
        };

        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[Mention]> = remaining.chunks(batch_size).collect();
        let batch_total = batches.len();

        // A checkpoint from a run with another batch size only counts for
        // batches whose records were all committed.
        let pending_keys: HashSet<MentionKey> = checkpoint.pending.iter().map(Mention::key).collect();
        checkpoint.completed_batches.retain(|i| {
            batches
                .get(*i)
                .is_some_and(|b| b.iter().all(|m| pending_keys.contains(&m.key())))
        });
        report.batches_resumed = (0..batch_total)
            .filter(|i| checkpoint.is_batch_done(*i))
            .count();

        info!(
            subsystem = "pipeline",
            component = "engine",
            op = "run",
            run_scope_id = %checkpoint.run_scope_id,
            record_count = remaining.len(),
            batch_total,
            resumed = report.batches_resumed,
            salvaged,
            backend = %self.selector.label(),
            "Enrichment run starting"
        );
        self.emit(EngineEvent::RunStarted {
            run_scope_id: checkpoint.run_scope_id.clone(),
            batch_total,
            resumed_batches: report.batches_resumed,
        });

        for (index, batch) in batches.iter().enumerate() {
            if checkpoint.is_batch_done(index) {
                debug!(batch_index = index, "Batch already committed, skipping");
                continue;
            }

            if report.batches_sent > 0 && !self.config.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }

            let result = self.process_batch(index, batch_total, batch).await;
            report.batches_sent += 1;

            checkpoint.completed_batches.push(index);
            checkpoint.pending.extend(result.mentions);
            self.checkpoints.save(&checkpoint)?;

            match result.outcome {
                Ok((backend, recovery_level)) => {
                    debug!(batch_index = index, state = ?BatchState::Committed, "Batch committed");
                    self.emit(EngineEvent::BatchCommitted {
                        batch_index: index,
                        backend,
                        recovery_level,
                    });
                }
                Err(failure) => {
                    report.batches_failed += 1;
                    self.emit(EngineEvent::BatchFailed {
                        batch_index: index,
                        failure,
                    });
                }
            }
        }

        report.committed = order_like(&to_enrich, checkpoint.pending);
        self.checkpoints.clear()?;

        info!(
            subsystem = "pipeline",
            component = "engine",
            op = "run",
            committed = report.committed.len(),
            batches_sent = report.batches_sent,
            batches_failed = report.batches_failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Enrichment run complete"
        );
        self.emit(EngineEvent::RunCompleted {
            committed: report.committed.len(),
        });
        Ok(report)
    }

    /// Checkpoint to continue from, the records it covers, and the number
    /// of records salvaged from a checkpoint of another scope.
    fn restore(&self, to_enrich: &[Mention]) -> (Checkpoint, Vec<Mention>, usize) {
        let scope = run_scope_id(to_enrich);

        let Some(previous) = self.checkpoints.load() else {
            return (Checkpoint::new(scope), to_enrich.to_vec(), 0);
        };

        if previous.run_scope_id == scope {
            info!(
                run_scope_id = %scope,
                completed = previous.completed_batches.len(),
                "Resuming from checkpoint"
            );
            return (previous, to_enrich.to_vec(), 0);
        }

        let wanted: HashSet<MentionKey> = to_enrich.iter().map(Mention::key).collect();
        let salvaged: Vec<Mention> = previous
            .pending
            .into_iter()
            .filter(|m| m.is_enriched() && wanted.contains(&m.key()))
            .collect();
        let salvaged_keys: HashSet<MentionKey> = salvaged.iter().map(Mention::key).collect();
        let remaining: Vec<Mention> = to_enrich
            .iter()
            .filter(|m| !salvaged_keys.contains(&m.key()))
            .cloned()
            .collect();

        warn!(
            previous_scope = %previous.run_scope_id,
            run_scope_id = %scope,
            salvaged = salvaged.len(),
            "Checkpoint belongs to a different input set, salvaging committed records"
        );

        let count = salvaged.len();
        let mut checkpoint = Checkpoint::new(run_scope_id(&remaining));
        checkpoint.pending = salvaged;
        (checkpoint, remaining, count)
    }

    #[instrument(
        skip_all,
        fields(subsystem = "pipeline", component = "engine", op = "process_batch", batch_index = index, batch_total = batch_total)
    )]
    async fn process_batch(&self, index: usize, batch_total: usize, batch: &[Mention]) -> BatchResult {
        let prompt = build_batch_prompt(&self.brand, batch);
        let mut hits = 0usize;

        let (text, backend) = loop {
            debug!(state = ?BatchState::Sent, prompt_len = prompt.len(), "Sending batch");
            let outcome = self.selector.classify_batch(&prompt).await;

            match outcome.result {
                Ok(text) => break (text, outcome.backend_used),
                Err(BackendError::RateLimited(msg)) => {
                    let Some(wait) = self.config.rate_limit_backoff.get(hits).copied() else {
                        warn!(
                            rate_limit_hits = hits + 1,
                            error = %msg,
                            "Rate limit retries exhausted, default-filling batch"
                        );
                        return default_filled(batch, BatchFailure::RateLimit);
                    };
                    hits += 1;
                    let state = BatchState::RateLimited { hits };
                    warn!(
                        rate_limit_hits = hits,
                        wait_secs = wait.as_secs(),
                        state = ?state,
                        "Rate limited, waiting before resend"
                    );
                    self.emit(EngineEvent::BatchRateLimited {
                        batch_index: index,
                        hits,
                        wait,
                    });
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    warn!(error = %e, "Batch could not be classified, default-filling");
                    return default_filled(batch, BatchFailure::Unreachable(e.to_string()));
                }
            }
        };

        let recovered = parse_batch_response(&text, batch.len());
        debug!(
            response_len = text.len(),
            recovery_level = recovered.level.as_u8(),
            state = ?BatchState::ParsedOrRecovered,
            "Response parsed"
        );

        let mentions: Vec<Mention> = batch
            .iter()
            .zip(recovered.items.iter())
            .map(|(mention, item)| {
                let mut enriched = mention.clone();
                enriched.enrichment = Some(Enrichment::from_model_output(item, backend));
                enriched
            })
            .collect();
        debug!(record_count = mentions.len(), state = ?BatchState::Validated, "Batch validated");

        BatchResult {
            mentions,
            outcome: Ok((backend, recovered.level.as_u8())),
        }
    }
}

fn default_filled(batch: &[Mention], failure: BatchFailure) -> BatchResult {
    debug!(state = ?BatchState::Failed(failure.clone()), "Batch failed");
    let mentions = batch
        .iter()
        .map(|m| {
            let mut filled = m.clone();
            filled.enrichment = Some(Enrichment::default_filled());
            filled
        })
        .collect();
    BatchResult {
        mentions,
        outcome: Err(failure),
    }
}

/// Committed mentions rearranged into the order of `reference`.
fn order_like(reference: &[Mention], committed: Vec<Mention>) -> Vec<Mention> {
    let mut by_key: HashMap<MentionKey, Mention> =
        committed.into_iter().map(|m| (m.key(), m)).collect();
    reference
        .iter()
        .filter_map(|m| by_key.remove(&m.key()))
        .collect()
}
