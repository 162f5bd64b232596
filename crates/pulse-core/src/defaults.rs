//! Centralized default constants for mention-pulse.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers; environment variables override them at the edges.

// =============================================================================
// FILES
// =============================================================================

/// Default data directory holding raw inputs and generated outputs.
pub const DATA_DIR: &str = "./data";

/// Default credential/config file loaded by the binary.
pub const CONFIG_FILE: &str = "config.env";

/// Merged (normalized + scored) dataset.
pub const MERGED_FILE: &str = "mentions.json";

/// Enriched dataset; doubles as the next run's enrichment cache.
pub const ENRICHED_FILE: &str = "mentions_enriched.json";

/// Critical-alert subset.
pub const ALERTS_FILE: &str = "critical_alerts.json";

/// Keyword co-occurrence view.
pub const WORD_CLOUD_FILE: &str = "word_cloud.json";

/// Dashboard feed script.
pub const DASHBOARD_FILE: &str = "data.js";

/// Weekly digest text.
pub const DIGEST_FILE: &str = "weekly_digest.txt";

/// In-flight run checkpoint. Absence means the previous run completed.
pub const CHECKPOINT_FILE: &str = ".enrichment_checkpoint.json";

/// Advisory lock file guarding the data directory.
pub const LOCK_FILE: &str = ".pulse.lock";

/// Suffix of per-source raw input files (`<platform>_raw.json`).
pub const RAW_FILE_SUFFIX: &str = "_raw.json";

// =============================================================================
// SENTIMENT
// =============================================================================

/// Compound score at or above which a text is positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Compound score at or below which a text is negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Records per classification batch.
pub const BATCH_SIZE: usize = 5;

/// Pause between successive batch calls in milliseconds.
pub const INTER_BATCH_DELAY_MS: u64 = 500;

/// Relevance below which the topic is forced to `irrelevant`.
pub const RELEVANCE_MIN: u8 = 7;

/// Relevance assigned when the backend gives none.
pub const DEFAULT_RELEVANCE: u8 = 5;

/// Maximum key phrases kept per record.
pub const MAX_KEY_PHRASES: usize = 3;

/// Record text is truncated to this many characters inside prompts.
pub const MAX_PROMPT_TEXT_CHARS: usize = 400;

/// Escalating waits after the 1st, 2nd and 3rd rate-limit response.
pub const RATE_LIMIT_BACKOFF_SECS: [u64; 3] = [60, 120, 180];

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default local generation model (fits a 6 GB GPU).
pub const LOCAL_MODEL: &str = "llama3.2:3b";

/// Bound on the local availability probe in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// Timeout for local generation requests in seconds.
pub const LOCAL_TIMEOUT_SECS: u64 = 180;

/// Attempts the local backend makes before reporting failure.
pub const LOCAL_RETRIES: u32 = 3;

/// Base wait between local retries in seconds (multiplied by attempt).
pub const LOCAL_RETRY_BASE_SECS: u64 = 5;

/// Default remote endpoint (Gemini's OpenAI-compatible surface).
pub const REMOTE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Default remote generation model.
pub const REMOTE_MODEL: &str = "gemini-2.0-flash-lite";

/// Timeout for remote generation requests in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 30;

/// Sampling temperature for classification calls.
pub const TEMPERATURE: f32 = 0.1;

/// Token budget for a classification response.
pub const MAX_RESPONSE_TOKENS: u32 = 1024;

/// Placeholder credential shipped in sample config files.
pub const CREDENTIAL_PLACEHOLDER: &str = "your_gemini_api_key_here";

// =============================================================================
// SEARCH
// =============================================================================

/// BM25 term-saturation parameter.
pub const BM25_K1: f64 = 1.5;

/// BM25 length-normalisation parameter.
pub const BM25_B: f64 = 0.75;

/// Cosine similarity at or above which a same-platform record is a near duplicate.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.85;

/// Maximum edit distance for a fuzzy brand match.
pub const FUZZY_MAX_DISTANCE: usize = 1;

/// Number of terms kept in the word-cloud view.
pub const WORD_CLOUD_TOP_N: usize = 50;

// =============================================================================
// BRAND
// =============================================================================

/// Brand monitored by default.
pub const BRAND_NAME: &str = "Matiks";

/// Reference document describing a relevant brand mention (BM25 query).
pub const BRAND_REFERENCE: &str = "matiks app math puzzle game ios android play store review \
    education learning startup iit guwahati problem solving level \
    multiplayer competitive leaderboard score rating bug crash feature";

/// Known spellings of the brand name.
pub const BRAND_VARIANTS: &[&str] = &[
    "matiks", "matics", "matick", "mattiks", "maatiks", "matix", "mattics", "matks",
];

// =============================================================================
// DIGEST
// =============================================================================

/// Days covered by the weekly digest.
pub const DIGEST_WINDOW_DAYS: i64 = 7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_symmetric() {
        assert_eq!(POSITIVE_THRESHOLD, -NEGATIVE_THRESHOLD);
    }

    #[test]
    fn test_backoff_escalates() {
        assert!(RATE_LIMIT_BACKOFF_SECS.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(RATE_LIMIT_BACKOFF_SECS, [60, 120, 180]);
    }

    #[test]
    fn test_relevance_bounds() {
        assert!(DEFAULT_RELEVANCE < RELEVANCE_MIN);
        assert!(RELEVANCE_MIN <= 10);
    }
}
