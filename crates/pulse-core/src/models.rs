//! Data models for mention-pulse.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::defaults;

// =============================================================================
// PLATFORM TYPES
// =============================================================================

/// Source platform of a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Reddit,
    Twitter,
    PlayStore,
    AppStore,
}

impl Platform {
    /// Every supported platform, in raw-file load order.
    pub const ALL: [Platform; 4] = [
        Platform::Reddit,
        Platform::Twitter,
        Platform::PlayStore,
        Platform::AppStore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reddit => "reddit",
            Self::Twitter => "twitter",
            Self::PlayStore => "playstore",
            Self::AppStore => "appstore",
        }
    }

    /// Name of this platform's raw input file (`<platform>_raw.json`).
    pub fn raw_file_name(&self) -> String {
        format!("{}{}", self.as_str(), defaults::RAW_FILE_SUFFIX)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reddit" => Ok(Self::Reddit),
            "twitter" => Ok(Self::Twitter),
            "playstore" => Ok(Self::PlayStore),
            "appstore" => Ok(Self::AppStore),
            _ => Err(format!("Invalid platform: {}", s)),
        }
    }
}

/// Composite identity of a mention: `(platform, id)`.
///
/// Rendered as `platform_id`, the dedup and cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MentionKey {
    pub platform: Platform,
    pub id: String,
}

impl MentionKey {
    pub fn new(platform: Platform, id: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for MentionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.platform, self.id)
    }
}

// =============================================================================
// SENTIMENT TYPES
// =============================================================================

/// Discrete baseline sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Map a compound score onto a label using the fixed thresholds.
    ///
    /// `compound >= 0.05` is positive, `compound <= -0.05` is negative and
    /// anything strictly between is neutral.
    pub fn from_compound(compound: f64) -> Self {
        if compound >= defaults::POSITIVE_THRESHOLD {
            Self::Positive
        } else if compound <= defaults::NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Neutral => write!(f, "neutral"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// Deterministic lexicon sentiment attached to every mention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineSentiment {
    pub label: SentimentLabel,
    /// Normalised score in `[-1, 1]`.
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

impl BaselineSentiment {
    /// Score for text carrying no sentiment at all.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            compound: 0.0,
            pos: 0.0,
            neu: 1.0,
            neg: 0.0,
        }
    }
}

// =============================================================================
// ENRICHMENT TYPES
// =============================================================================

/// Classification topic assigned by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    BugReport,
    FeatureRequest,
    Praise,
    Question,
    CompetitorComparison,
    #[default]
    General,
    Irrelevant,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BugReport => "bug_report",
            Self::FeatureRequest => "feature_request",
            Self::Praise => "praise",
            Self::Question => "question",
            Self::CompetitorComparison => "competitor_comparison",
            Self::General => "general",
            Self::Irrelevant => "irrelevant",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Topic {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bug_report" => Ok(Self::BugReport),
            "feature_request" => Ok(Self::FeatureRequest),
            "praise" => Ok(Self::Praise),
            "question" => Ok(Self::Question),
            "competitor_comparison" => Ok(Self::CompetitorComparison),
            "general" => Ok(Self::General),
            "irrelevant" => Ok(Self::Irrelevant),
            _ => Err(format!("Invalid topic: {}", s)),
        }
    }
}

/// Five-point sentiment assigned by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmSentiment {
    VeryNegative,
    Negative,
    #[default]
    Mixed,
    Positive,
    VeryPositive,
}

impl std::fmt::Display for LlmSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VeryNegative => write!(f, "very_negative"),
            Self::Negative => write!(f, "negative"),
            Self::Mixed => write!(f, "mixed"),
            Self::Positive => write!(f, "positive"),
            Self::VeryPositive => write!(f, "very_positive"),
        }
    }
}

impl std::str::FromStr for LlmSentiment {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "very_negative" => Ok(Self::VeryNegative),
            "negative" => Ok(Self::Negative),
            "mixed" => Ok(Self::Mixed),
            "positive" => Ok(Self::Positive),
            "very_positive" => Ok(Self::VeryPositive),
            _ => Err(format!("Invalid LLM sentiment: {}", s)),
        }
    }
}

/// Classification backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Locally hosted Ollama model.
    Local,
    /// Remote OpenAI-compatible API.
    Remote,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(format!("Invalid backend kind: {}", s)),
        }
    }
}

/// LLM classification of a mention.
///
/// `key_phrases` is required, so a mention holding an `Enrichment` is by
/// construction fully enriched. Construct through [`Enrichment::new`] (or the
/// lenient parsers) so the relevance and criticality rules always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrichment {
    /// 0-10 brand relevance.
    pub relevance: u8,
    pub topic: Topic,
    pub llm_sentiment: LlmSentiment,
    /// At most three short phrases.
    pub key_phrases: Vec<String>,
    /// Derived: `topic == bug_report && llm_sentiment == very_negative`.
    pub is_critical: bool,
    /// Backend that produced the classification; `None` when default-filled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classified_by: Option<BackendKind>,
}

impl Enrichment {
    /// Build an enrichment, enforcing the derived fields.
    ///
    /// Relevance is clamped to `0..=10`, key phrases truncated to three,
    /// relevance below the minimum forces `Topic::Irrelevant`, and
    /// `is_critical` is recomputed from topic and sentiment.
    pub fn new(
        relevance: u8,
        topic: Topic,
        llm_sentiment: LlmSentiment,
        mut key_phrases: Vec<String>,
        classified_by: Option<BackendKind>,
    ) -> Self {
        let relevance = relevance.min(10);
        let topic = if relevance < defaults::RELEVANCE_MIN {
            Topic::Irrelevant
        } else {
            topic
        };
        key_phrases.truncate(defaults::MAX_KEY_PHRASES);
        let is_critical = topic == Topic::BugReport && llm_sentiment == LlmSentiment::VeryNegative;

        Self {
            relevance,
            topic,
            llm_sentiment,
            key_phrases,
            is_critical,
            classified_by,
        }
    }

    /// Enrichment committed when no usable classification was obtained.
    pub fn default_filled() -> Self {
        Self::new(
            defaults::DEFAULT_RELEVANCE,
            Topic::General,
            LlmSentiment::Mixed,
            Vec::new(),
            None,
        )
    }

    /// Validate one model-produced object, substituting defaults for missing
    /// or malformed fields.
    ///
    /// Relevance accepts integers, floats and numeric strings (truncated,
    /// clamped). Unknown topics become `general`, unknown sentiments `mixed`.
    /// Key phrases keep the first three entries, stringified. Any
    /// `is_critical` the model supplied is ignored.
    pub fn from_model_output(value: &JsonValue, classified_by: Option<BackendKind>) -> Self {
        let obj = value.as_object();
        let field = |name: &str| obj.and_then(|o| o.get(name));

        let relevance = field("relevance")
            .and_then(parse_relevance)
            .unwrap_or(defaults::DEFAULT_RELEVANCE);

        let topic = field("topic")
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(Topic::General);

        let llm_sentiment = field("llm_sentiment")
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(LlmSentiment::Mixed);

        let key_phrases = match field("key_phrases") {
            Some(JsonValue::Array(items)) => items
                .iter()
                .take(defaults::MAX_KEY_PHRASES)
                .map(stringify_phrase)
                .collect(),
            _ => Vec::new(),
        };

        Self::new(relevance, topic, llm_sentiment, key_phrases, classified_by)
    }

    /// Interpret a stored enrichment object.
    ///
    /// Returns `None` unless `key_phrases` is present, which marks the
    /// mention as not yet enriched.
    pub fn from_stored(value: &JsonValue) -> Option<Self> {
        let obj = value.as_object()?;
        match obj.get("key_phrases") {
            None | Some(JsonValue::Null) => return None,
            Some(_) => {}
        }
        let classified_by = obj
            .get("classified_by")
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse().ok());
        Some(Self::from_model_output(value, classified_by))
    }
}

impl<'de> Deserialize<'de> for Enrichment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_stored(&value)
            .ok_or_else(|| serde::de::Error::custom("enrichment is missing key_phrases"))
    }
}

fn parse_relevance(value: &JsonValue) -> Option<u8> {
    let raw = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if raw.is_nan() {
        return None;
    }
    Some(raw.trunc().clamp(0.0, 10.0) as u8)
}

fn stringify_phrase(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Deserialize an optional enrichment, mapping incomplete objects to `None`.
fn deserialize_complete_enrichment<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Enrichment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Enrichment::from_stored))
}

// =============================================================================
// SEARCH TYPES
// =============================================================================

/// Offline search scoring attached to a mention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchFields {
    /// BM25 relevance against the brand reference query.
    pub bm25_score: f64,
    /// Near-identical to an earlier record on the same platform.
    pub is_near_duplicate: bool,
    /// Mentions a known spelling of the brand, exactly or within one edit.
    pub fuzzy_brand_match: bool,
}

// =============================================================================
// MENTION
// =============================================================================

/// One normalized social mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub platform: Platform,
    pub created_at: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub raw_metrics: BTreeMap<String, f64>,
    pub baseline_sentiment: BaselineSentiment,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_complete_enrichment"
    )]
    pub enrichment: Option<Enrichment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<SearchFields>,
}

impl Mention {
    pub fn key(&self) -> MentionKey {
        MentionKey::new(self.platform, self.id.clone())
    }

    /// Whether the mention carries a complete classification.
    pub fn is_enriched(&self) -> bool {
        self.enrichment.is_some()
    }

    /// Whether the mention should surface as a critical alert.
    pub fn is_critical(&self) -> bool {
        self.enrichment.as_ref().is_some_and(|e| e.is_critical)
    }
}

// =============================================================================
// DATASET TYPES
// =============================================================================

/// Header of a persisted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub generated_at: DateTime<Utc>,
    /// Surviving records per platform.
    pub source_counts: BTreeMap<String, usize>,
    #[serde(default)]
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub malformed_dropped: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates_dropped: Option<usize>,
    /// Primary backend of the run: "local", "remote" or "none".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_topic: Option<BTreeMap<String, usize>>,
    /// Enriched records per `llm_sentiment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_sentiment: Option<BTreeMap<String, usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_count: Option<usize>,
}

impl DatasetMeta {
    /// Meta with counts derived from `records`.
    pub fn for_records(generated_at: DateTime<Utc>, records: &[Mention]) -> Self {
        let mut source_counts = BTreeMap::new();
        for m in records {
            *source_counts.entry(m.platform.to_string()).or_insert(0) += 1;
        }
        Self {
            generated_at,
            source_counts,
            total: records.len(),
            malformed_dropped: None,
            duplicates_dropped: None,
            llm_backend: None,
            by_topic: None,
            by_sentiment: None,
            critical_count: None,
        }
    }
}

/// A persisted set of mentions with its header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub meta: DatasetMeta,
    pub records: Vec<Mention>,
}

/// One entry of the keyword co-occurrence view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCloudEntry {
    pub term: String,
    pub count: usize,
}

// =============================================================================
// CHECKPOINT
// =============================================================================

/// Progress record of an in-flight enrichment run.
///
/// `pending` holds the mentions committed so far, in commit order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Digest identifying the ordered set of mentions this run enriches.
    pub run_scope_id: String,
    /// Zero-based indices of committed batches.
    pub completed_batches: Vec<usize>,
    pub pending: Vec<Mention>,
}

impl Checkpoint {
    pub fn new(run_scope_id: impl Into<String>) -> Self {
        Self {
            run_scope_id: run_scope_id.into(),
            completed_batches: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn is_batch_done(&self, index: usize) -> bool {
        self.completed_batches.contains(&index)
    }
}
