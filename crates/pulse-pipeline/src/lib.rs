//! # pulse-pipeline
//!
//! Incremental merge and enrichment pipeline for mention-pulse.
//!
//! A run normalizes raw source files into one deduplicated timeline,
//! scores every mention offline, diffs the result against the previous
//! enriched dataset, classifies only what is new through a checkpointed
//! batch engine, and writes the final dataset with its derived views.
//!
//! ```text
//! raw files -> normalize -> sentiment -> cache diff -> search scoring
//!           -> batch engine (selector, checkpoint) -> materialize -> digest
//! ```

pub mod cache;
pub mod checkpoint;
pub mod context;
pub mod digest;
pub mod engine;
pub mod lock;
pub mod materialize;
pub mod normalize;
pub mod run;

pub use cache::{merge_in_order, CacheDiff, EnrichmentCache};
pub use checkpoint::{run_scope_id, CheckpointStore};
pub use context::{PipelineConfig, RunContext};
pub use digest::{build_digest, digest_due, offline_digest};
pub use engine::{BatchEngine, BatchFailure, BatchState, EngineConfig, EngineEvent, EngineReport};
pub use lock::RunLock;
pub use materialize::{materialize, write_outputs, MaterializedOutput, RunSummary};
pub use normalize::{normalize, normalize_record, NormalizeReport, PlatformSource, RawRecord};
pub use run::{run_digest_only, run_pipeline, score_baseline_sentiment, DigestMode, RunOutcome};
