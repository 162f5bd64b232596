//! Structured logging schema and field name constants for mention-pulse.
//!
//! The field names every crate emits. `tracing` macros take field names as
//! identifiers, so call sites spell them out; the constants here are the
//! reference list for querying a run's log stream.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Run-terminating failure (checkpoint durability, invalid input) |
//! | WARN  | Recoverable issue, automatic fallback or default fill applied |
//! | INFO  | Lifecycle events (run start/end, backend choice, batch commit) |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-record iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "pipeline", "inference", "search", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "normalizer", "cache", "selector", "engine", "ollama", "remote"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "normalize", "diff", "classify_batch", "commit"
pub const OPERATION: &str = "op";

/// Digest identifying the set of records a run enriches.
pub const RUN_SCOPE_ID: &str = "run_scope_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Zero-based batch index within a run.
pub const BATCH_INDEX: &str = "batch_index";

/// Total batches planned for a run.
pub const BATCH_TOTAL: &str = "batch_total";

/// Composite `platform_id` key of a mention.
pub const MENTION_KEY: &str = "mention_key";

/// Platform tag.
pub const PLATFORM: &str = "platform";

/// Backend that served a call ("local", "remote").
pub const BACKEND: &str = "backend";

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records in a set.
pub const RECORD_COUNT: &str = "record_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Rate-limit responses seen for the current batch.
pub const RATE_LIMIT_HITS: &str = "rate_limit_hits";

/// Seconds waited before a retry.
pub const WAIT_SECS: &str = "wait_secs";

/// Response recovery level that succeeded (1-4).
pub const RECOVERY_LEVEL: &str = "recovery_level";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";

/// Every field name above.
pub const ALL_FIELDS: &[&str] = &[
    SUBSYSTEM,
    COMPONENT,
    OPERATION,
    RUN_SCOPE_ID,
    BATCH_INDEX,
    BATCH_TOTAL,
    MENTION_KEY,
    PLATFORM,
    BACKEND,
    MODEL,
    DURATION_MS,
    RECORD_COUNT,
    PROMPT_LEN,
    RESPONSE_LEN,
    RATE_LIMIT_HITS,
    WAIT_SECS,
    RECOVERY_LEVEL,
    ERROR_MSG,
    SLOW,
];
