//! End-to-end run orchestration.

use std::time::Instant;

use tracing::{info, instrument};

use pulse_core::defaults;
use pulse_core::{Dataset, Error, Mention, Result};
use pulse_search::analyze_sentiment;

use crate::cache::EnrichmentCache;
use crate::context::RunContext;
use crate::digest::{build_digest, digest_due, write_digest};
use crate::engine::{BatchEngine, EngineEvent};
use crate::lock::RunLock;
use crate::materialize::{materialize, merged_dataset, write_json, write_outputs, RunSummary};
use crate::normalize::{load_sources, normalize};

/// How the digest is handled for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestMode {
    /// Produce the digest only on its schedule.
    #[default]
    Scheduled,
    /// Always produce the digest after the run.
    Forced,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub total: usize,
    pub new_this_run: usize,
    pub already_done: usize,
    pub critical_count: usize,
    pub llm_backend: String,
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub digest_written: bool,
}

/// Assign the baseline sentiment to every mention.
pub fn score_baseline_sentiment(mentions: &mut [Mention]) {
    for mention in mentions.iter_mut() {
        mention.baseline_sentiment = analyze_sentiment(&mention.text);
    }
}

/// Merge, score, enrich and materialize the data directory.
///
/// Holds the run lock for the whole run. Fails when a source file is
/// invalid, when no source file exists, or when the checkpoint cannot be
/// written; in every failure case the previous enriched dataset is left
/// untouched.
#[instrument(skip_all, fields(subsystem = "pipeline", component = "run", op = "run_pipeline"))]
pub async fn run_pipeline(ctx: &RunContext, digest: DigestMode) -> Result<RunOutcome> {
    let start = Instant::now();
    let _lock = RunLock::acquire(ctx.data_dir())?;

    let sources = load_sources(ctx.data_dir())?;
    if sources.is_empty() {
        return Err(Error::InvalidDataset(format!(
            "no *{} source files in {}",
            defaults::RAW_FILE_SUFFIX,
            ctx.data_dir().display()
        )));
    }

    let report = normalize(sources);
    let mut candidates = report.mentions;
    score_baseline_sentiment(&mut candidates);

    let summary = RunSummary {
        malformed: report.malformed,
        duplicates: report.duplicates,
        llm_backend: ctx.selector.label(),
    };

    let search = ctx.config.search_config();
    let cache = EnrichmentCache::load(&ctx.path(defaults::ENRICHED_FILE));
    let mut diff = cache.diff(candidates);
    diff.score_search_fields(&search);

    write_json(
        &ctx.path(defaults::MERGED_FILE),
        &merged_dataset(diff.merged_view(), &summary, ctx.now),
    )?;

    let engine = BatchEngine::new(
        ctx.selector.clone(),
        ctx.config.brand_context(),
        ctx.config.engine_config(),
        ctx.checkpoints(),
    );
    let mut events = engine.events();
    let engine_report = engine.run(diff.to_enrich.clone()).await?;
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::BatchFailed { batch_index, failure } = event {
            info!(batch_index, failure = %failure, "Batch committed with defaults");
        }
    }

    let already_done = diff.already_done.len();
    let output = materialize(diff, engine_report.committed, &summary, ctx.now, &search);
    write_outputs(ctx.data_dir(), &output)?;

    let mut outcome = RunOutcome {
        total: output.dataset.records.len(),
        new_this_run: output.new_this_run,
        already_done,
        critical_count: output.alerts.len(),
        llm_backend: summary.llm_backend,
        batches_sent: engine_report.batches_sent,
        batches_failed: engine_report.batches_failed,
        digest_written: false,
    };

    if digest_due(ctx.now, digest == DigestMode::Forced) {
        let text = build_digest(
            &ctx.selector,
            &ctx.config.brand_context(),
            &output.dataset.records,
            ctx.now,
        )
        .await;
        write_digest(ctx.data_dir(), &text)?;
        outcome.digest_written = true;
    }

    info!(
        total = outcome.total,
        new_this_run = outcome.new_this_run,
        already_done = outcome.already_done,
        critical_count = outcome.critical_count,
        backend = %outcome.llm_backend,
        duration_ms = start.elapsed().as_millis() as u64,
        "Run complete"
    );
    Ok(outcome)
}

/// Produce only the digest, from the current enriched dataset.
#[instrument(skip_all, fields(subsystem = "pipeline", component = "run", op = "run_digest_only"))]
pub async fn run_digest_only(ctx: &RunContext) -> Result<String> {
    let _lock = RunLock::acquire(ctx.data_dir())?;

    let path = ctx.path(defaults::ENRICHED_FILE);
    let bytes = std::fs::read(&path)
        .map_err(|e| Error::InvalidDataset(format!("{}: {}", path.display(), e)))?;
    let dataset: Dataset = serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidDataset(format!("{}: {}", path.display(), e)))?;

    let text = build_digest(
        &ctx.selector,
        &ctx.config.brand_context(),
        &dataset.records,
        ctx.now,
    )
    .await;
    write_digest(ctx.data_dir(), &text)?;
    Ok(text)
}
