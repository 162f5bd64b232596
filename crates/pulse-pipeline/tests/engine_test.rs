//! Batch engine behaviour: checkpointed resume, rate-limit backoff,
//! response recovery and validation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;

use pulse_core::{
    BackendError, BackendKind, BaselineSentiment, Checkpoint, Enrichment, Error,
    GenerationBackend, LlmSentiment, Mention, Platform, Topic,
};
use pulse_inference::mock::MockBackend;
use pulse_inference::{BackendSelector, BrandContext};
use pulse_pipeline::{BatchEngine, BatchFailure, CheckpointStore, EngineConfig, EngineEvent};

fn mention(i: usize) -> Mention {
    Mention {
        id: format!("m{:02}", i),
        platform: Platform::Reddit,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(i as i64),
        text: format!("matiks post number {}", i),
        author: None,
        url: None,
        raw_metrics: Default::default(),
        baseline_sentiment: BaselineSentiment::neutral(),
        enrichment: None,
        search_fields: None,
    }
}

fn mentions(n: usize) -> Vec<Mention> {
    (0..n).map(mention).collect()
}

fn good_item() -> serde_json::Value {
    json!({
        "relevance": 9,
        "topic": "praise",
        "llm_sentiment": "positive",
        "key_phrases": ["fun puzzles", "daily streak"],
        "is_critical": false
    })
}

async fn selector_with(backend: &MockBackend) -> BackendSelector {
    let arc: Arc<dyn GenerationBackend> = Arc::new(backend.clone());
    match backend.kind() {
        BackendKind::Local => BackendSelector::probe(Some(arc), None).await,
        BackendKind::Remote => BackendSelector::probe(None, Some(arc)).await,
    }
}

fn engine(selector: BackendSelector, store: CheckpointStore, batch_size: usize, delay_ms: u64) -> BatchEngine {
    BatchEngine::new(
        selector,
        BrandContext::default(),
        EngineConfig::default()
            .with_batch_size(batch_size)
            .with_inter_batch_delay(Duration::from_millis(delay_ms)),
        store,
    )
}

// =============================================================================
// Checkpoint and Resume
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_crash_after_seven_of_ten_batches_resumes_without_resending() {
    let records = mentions(10);

    // Uninterrupted reference run.
    let reference_dir = tempfile::tempdir().unwrap();
    let reference_backend = MockBackend::new(BackendKind::Local).with_uniform_classification(good_item());
    let reference = engine(
        selector_with(&reference_backend).await,
        CheckpointStore::in_dir(reference_dir.path()),
        1,
        500,
    )
    .run(records.clone())
    .await
    .unwrap();
    assert_eq!(reference_backend.call_count(), 10);

    // Interrupted run: batches are sent at t = 0, 500, ..., 3000 ms, so the
    // run is dropped after the seventh commit while waiting to send the next.
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::in_dir(dir.path());
    let first_backend = MockBackend::new(BackendKind::Local).with_uniform_classification(good_item());
    let first = engine(selector_with(&first_backend).await, store.clone(), 1, 500);
    let interrupted = tokio::time::timeout(Duration::from_millis(3250), first.run(records.clone())).await;
    assert!(interrupted.is_err(), "run should have been interrupted");
    assert_eq!(first_backend.call_count(), 7);

    let checkpoint = store.load().expect("checkpoint left behind");
    assert_eq!(checkpoint.completed_batches, (0..7).collect::<Vec<_>>());
    assert_eq!(checkpoint.pending.len(), 7);

    // Restart.
    let second_backend = MockBackend::new(BackendKind::Local).with_uniform_classification(good_item());
    let report = engine(selector_with(&second_backend).await, store.clone(), 1, 500)
        .run(records.clone())
        .await
        .unwrap();

    assert_eq!(second_backend.call_count(), 3);
    let sent: Vec<String> = second_backend.calls().into_iter().map(|c| c.prompt).collect();
    for (prompt, expected) in sent.iter().zip([7, 8, 9]) {
        assert!(prompt.contains(&format!("\"\"\"matiks post number {}\"\"\"", expected)));
    }
    for earlier in 0..7 {
        let text = format!("\"\"\"matiks post number {}\"\"\"", earlier);
        assert!(sent.iter().all(|p| !p.contains(&text)), "batch {} was resent", earlier);
    }

    assert_eq!(report.batches_resumed, 7);
    assert_eq!(report.batches_sent, 3);
    assert_eq!(report.committed, reference.committed);
    assert!(!store.exists(), "checkpoint cleared on completion");
}

#[tokio::test]
async fn test_checkpoint_written_after_each_commit() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::in_dir(dir.path());
    let backend = MockBackend::new(BackendKind::Local).with_uniform_classification(good_item());
    let engine = engine(selector_with(&backend).await, store.clone(), 2, 0);
    let mut events = engine.events();

    let report = engine.run(mentions(5)).await.unwrap();
    assert_eq!(report.committed.len(), 5);
    assert_eq!(report.batches_sent, 3);
    assert!(!store.exists());

    let mut committed = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::BatchCommitted { batch_index, backend, recovery_level } = event {
            assert_eq!(backend, Some(BackendKind::Local));
            assert_eq!(recovery_level, 1);
            committed.push(batch_index);
        }
    }
    assert_eq!(committed, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_checkpoint_persistence_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::in_dir(&dir.path().join("gone"));
    let backend = MockBackend::new(BackendKind::Local).with_uniform_classification(good_item());

    let err = engine(selector_with(&backend).await, store, 5, 0)
        .run(mentions(10))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CheckpointPersistence(_)));
    assert_eq!(backend.call_count(), 1, "no batch sent after a failed checkpoint write");
}

#[tokio::test]
async fn test_foreign_checkpoint_is_salvaged() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::in_dir(dir.path());

    let mut done = mention(0);
    done.enrichment = Some(Enrichment::new(
        10,
        Topic::Question,
        LlmSentiment::Mixed,
        vec!["how to".into()],
        Some(BackendKind::Remote),
    ));
    let mut stranger = mention(99);
    stranger.enrichment = done.enrichment.clone();
    let mut foreign = Checkpoint::new("some-other-scope");
    foreign.completed_batches = vec![0];
    foreign.pending = vec![done.clone(), stranger];
    store.save(&foreign).unwrap();

    let backend = MockBackend::new(BackendKind::Local).with_uniform_classification(good_item());
    let report = engine(selector_with(&backend).await, store.clone(), 5, 0)
        .run(mentions(3))
        .await
        .unwrap();

    assert_eq!(report.salvaged, 1);
    assert_eq!(report.committed.len(), 3);
    assert_eq!(report.committed[0], done);
    assert_eq!(backend.call_count(), 1);
    assert!(!backend.calls()[0].prompt.contains("matiks post number 0\"\"\""));
}

// =============================================================================
// Rate Limits
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_three_rate_limits_back_off_then_fourth_default_fills() {
    let dir = tempfile::tempdir().unwrap();
    let rate_limited = || Err(BackendError::RateLimited("429".into()));
    let backend = MockBackend::new(BackendKind::Remote)
        .with_uniform_classification(good_item())
        .with_script(vec![rate_limited(), rate_limited(), rate_limited(), rate_limited()]);
    let engine = engine(selector_with(&backend).await, CheckpointStore::in_dir(dir.path()), 5, 0);
    let mut events = engine.events();

    let report = engine.run(mentions(2)).await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_secs(60));
    assert_eq!(calls[2].at - calls[1].at, Duration::from_secs(120));
    assert_eq!(calls[3].at - calls[2].at, Duration::from_secs(180));

    assert_eq!(report.batches_failed, 1);
    for m in &report.committed {
        assert_eq!(m.enrichment, Some(Enrichment::default_filled()));
    }

    let mut waits = Vec::new();
    let mut failure = None;
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::BatchRateLimited { wait, .. } => waits.push(wait.as_secs()),
            EngineEvent::BatchFailed { failure: f, .. } => failure = Some(f),
            _ => {}
        }
    }
    assert_eq!(waits, vec![60, 120, 180]);
    assert_eq!(failure, Some(BatchFailure::RateLimit));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_then_success_classifies() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(BackendKind::Remote)
        .with_uniform_classification(good_item())
        .with_script(vec![Err(BackendError::RateLimited("429".into()))]);

    let report = engine(selector_with(&backend).await, CheckpointStore::in_dir(dir.path()), 5, 0)
        .run(mentions(1))
        .await
        .unwrap();

    assert_eq!(backend.call_count(), 2);
    assert_eq!(report.batches_failed, 0);
    let enrichment = report.committed[0].enrichment.as_ref().unwrap();
    assert_eq!(enrichment.topic, Topic::Praise);
    assert_eq!(enrichment.classified_by, Some(BackendKind::Remote));
}

#[tokio::test(start_paused = true)]
async fn test_inter_batch_delay_between_calls() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(BackendKind::Local).with_uniform_classification(good_item());
    engine(selector_with(&backend).await, CheckpointStore::in_dir(dir.path()), 1, 500)
        .run(mentions(3))
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(500));
    assert_eq!(calls[2].at - calls[1].at, Duration::from_millis(500));
}

// =============================================================================
// Recovery and Validation
// =============================================================================

#[tokio::test]
async fn test_truncated_fifth_object_is_defaulted() {
    let dir = tempfile::tempdir().unwrap();
    let item = good_item().to_string();
    let response = format!("[{item}, {item}, {item}, {item}, {{\"relevance\": 8, \"topic\": \"pra");
    let backend = MockBackend::new(BackendKind::Local).with_fixed_response(response);

    let report = engine(selector_with(&backend).await, CheckpointStore::in_dir(dir.path()), 5, 0)
        .run(mentions(5))
        .await
        .unwrap();

    assert_eq!(report.committed.len(), 5);
    for m in &report.committed[..4] {
        let e = m.enrichment.as_ref().unwrap();
        assert_eq!(e.relevance, 9);
        assert_eq!(e.topic, Topic::Praise);
    }
    let last = report.committed[4].enrichment.as_ref().unwrap();
    assert_eq!(last.relevance, 5);
    assert_eq!(last.topic, Topic::Irrelevant);
    assert_eq!(last.llm_sentiment, LlmSentiment::Mixed);
    assert!(last.key_phrases.is_empty());
    assert_eq!(report.batches_failed, 0);
}

#[tokio::test]
async fn test_critical_flag_is_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let response = json!([
        {"relevance": 9, "topic": "praise", "llm_sentiment": "very_negative",
         "key_phrases": ["x"], "is_critical": true},
        {"relevance": 10, "topic": "bug_report", "llm_sentiment": "very_negative",
         "key_phrases": ["crash"], "is_critical": false},
        {"relevance": 3, "topic": "bug_report", "llm_sentiment": "very_negative",
         "key_phrases": ["bike"], "is_critical": true}
    ])
    .to_string();
    let backend = MockBackend::new(BackendKind::Local).with_fixed_response(response);

    let report = engine(selector_with(&backend).await, CheckpointStore::in_dir(dir.path()), 5, 0)
        .run(mentions(3))
        .await
        .unwrap();

    let flags: Vec<bool> = report.committed.iter().map(Mention::is_critical).collect();
    assert_eq!(flags, vec![false, true, false]);
    assert_eq!(
        report.committed[2].enrichment.as_ref().unwrap().topic,
        Topic::Irrelevant
    );
}

// =============================================================================
// Backend Availability
// =============================================================================

#[tokio::test]
async fn test_unreachable_backend_default_fills() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(BackendKind::Local)
        .with_failure(BackendError::Unreachable("connection refused".into()));

    let report = engine(selector_with(&backend).await, CheckpointStore::in_dir(dir.path()), 5, 0)
        .run(mentions(2))
        .await
        .unwrap();

    assert_eq!(report.batches_failed, 1);
    assert_eq!(report.committed.len(), 2);
    assert!(report
        .committed
        .iter()
        .all(|m| m.enrichment == Some(Enrichment::default_filled())));
}

#[tokio::test]
async fn test_local_failure_falls_back_to_remote() {
    let dir = tempfile::tempdir().unwrap();
    let local = MockBackend::new(BackendKind::Local)
        .with_failure(BackendError::Unreachable("timeout".into()));
    let remote = MockBackend::new(BackendKind::Remote).with_uniform_classification(good_item());
    let selector = BackendSelector::probe(
        Some(Arc::new(local.clone())),
        Some(Arc::new(remote.clone())),
    )
    .await;

    let report = engine(selector, CheckpointStore::in_dir(dir.path()), 5, 0)
        .run(mentions(2))
        .await
        .unwrap();

    assert_eq!(local.call_count(), 1);
    assert_eq!(remote.call_count(), 1);
    assert!(report
        .committed
        .iter()
        .all(|m| m.enrichment.as_ref().unwrap().classified_by == Some(BackendKind::Remote)));
}

#[tokio::test]
async fn test_no_backend_produces_no_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let report = engine(BackendSelector::none(), CheckpointStore::in_dir(dir.path()), 5, 0)
        .run(mentions(3))
        .await
        .unwrap();
    assert!(report.committed.is_empty());
    assert_eq!(report.batches_sent, 0);
}
