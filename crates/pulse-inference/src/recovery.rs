//! Recovery of per-record classifications from free-form model output.
//!
//! Models are asked for a bare JSON array but frequently wrap it in
//! markdown fences, prepend prose, or truncate mid-array. Recovery walks
//! four levels and always returns exactly one slot per batch record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[a-zA-Z]*\n?").expect("valid regex"));
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n?```$").expect("valid regex"));
static FLAT_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]+\}").expect("valid regex"));

/// Which recovery strategy produced the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryLevel {
    /// The whole response parsed as a JSON array.
    Direct,
    /// The span between the first `[` and the last `]` parsed as an array.
    Bracketed,
    /// Individual flat objects were scraped from the text.
    Partial,
    /// Nothing usable; every slot is empty.
    Fallback,
}

impl RecoveryLevel {
    /// Numeric level, 1 (direct) through 4 (fallback).
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Direct => 1,
            Self::Bracketed => 2,
            Self::Partial => 3,
            Self::Fallback => 4,
        }
    }
}

/// Per-record values aligned with the batch, plus how they were obtained.
#[derive(Debug, Clone)]
pub struct RecoveredBatch {
    /// Exactly `batch_size` entries; `{}` where nothing was recovered.
    pub items: Vec<JsonValue>,
    pub level: RecoveryLevel,
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    let opened = FENCE_OPEN.replace(trimmed, "");
    FENCE_CLOSE.replace(&opened, "").trim().to_string()
}

/// Parse a batch response into exactly `batch_size` values.
///
/// Never fails: unusable output yields empty objects which the caller
/// turns into default-filled enrichments.
pub fn parse_batch_response(text: &str, batch_size: usize) -> RecoveredBatch {
    let cleaned = strip_fences(text);

    if let Ok(JsonValue::Array(items)) = serde_json::from_str::<JsonValue>(&cleaned) {
        return finish(items, batch_size, RecoveryLevel::Direct);
    }

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            if let Ok(JsonValue::Array(items)) =
                serde_json::from_str::<JsonValue>(&cleaned[start..=end])
            {
                return finish(items, batch_size, RecoveryLevel::Bracketed);
            }
        }
    }

    let scraped: Vec<JsonValue> = FLAT_OBJECT
        .find_iter(&cleaned)
        .filter_map(|m| serde_json::from_str::<JsonValue>(m.as_str()).ok())
        .filter(JsonValue::is_object)
        .collect();
    if !scraped.is_empty() {
        return finish(scraped, batch_size, RecoveryLevel::Partial);
    }

    warn!(
        subsystem = "inference",
        component = "recovery",
        batch_size,
        response_len = text.len(),
        recovery_level = 4u8,
        "No classifications recoverable from response"
    );
    RecoveredBatch {
        items: empty_slots(batch_size),
        level: RecoveryLevel::Fallback,
    }
}

fn finish(mut items: Vec<JsonValue>, batch_size: usize, level: RecoveryLevel) -> RecoveredBatch {
    if items.len() != batch_size {
        debug!(
            subsystem = "inference",
            component = "recovery",
            recovered = items.len(),
            batch_size,
            recovery_level = level.as_u8(),
            "Response length mismatch, aligning to batch"
        );
    }
    items.truncate(batch_size);
    items.resize_with(batch_size, empty_object);
    RecoveredBatch { items, level }
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

fn empty_slots(n: usize) -> Vec<JsonValue> {
    (0..n).map(|_| empty_object()).collect()
}
