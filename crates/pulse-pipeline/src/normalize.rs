//! Raw record normalization and deduplication.
//!
//! Each source file is an unordered JSON array of platform-shaped records.
//! The normalizer dispatches on each record's own `platform` tag, extracts
//! the combined text view and platform metrics, drops malformed records,
//! keeps the first occurrence of every `(platform, id)` and orders the
//! result newest first.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, trace, warn};

use pulse_core::{BaselineSentiment, Error, Mention, MentionKey, Platform, Result};

/// One record as produced by a collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub JsonValue);

impl RawRecord {
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.as_object().and_then(|o| o.get(field))
    }

    /// Non-empty trimmed string value of `field`.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Numeric value of `field`, accepting numeric strings.
    pub fn num_field(&self, field: &str) -> Option<f64> {
        let value = match self.get(field)? {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse::<f64>().ok(),
            JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }

    /// Record id; numeric ids are stringified.
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Platform-specific text and metric extraction.
pub trait PlatformSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Combined text view of a record.
    fn text(&self, raw: &RawRecord) -> String;

    /// Platform numerics carried as `raw_metrics`.
    fn metrics(&self, raw: &RawRecord) -> BTreeMap<String, f64>;
}

fn title_and_text(raw: &RawRecord) -> String {
    let title = raw.str_field("title").unwrap_or("");
    let text = raw.str_field("text").unwrap_or("");
    format!("{} {}", title, text).trim().to_string()
}

fn collect_metrics(raw: &RawRecord, fields: &[(&str, &str)]) -> BTreeMap<String, f64> {
    fields
        .iter()
        .filter_map(|(src, dst)| raw.num_field(src).map(|v| (dst.to_string(), v)))
        .collect()
}

pub struct RedditSource;

impl PlatformSource for RedditSource {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    fn text(&self, raw: &RawRecord) -> String {
        title_and_text(raw)
    }

    fn metrics(&self, raw: &RawRecord) -> BTreeMap<String, f64> {
        collect_metrics(raw, &[("score", "score"), ("num_comments", "num_comments")])
    }
}

pub struct TwitterSource;

impl PlatformSource for TwitterSource {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn text(&self, raw: &RawRecord) -> String {
        raw.str_field("text").unwrap_or("").to_string()
    }

    fn metrics(&self, raw: &RawRecord) -> BTreeMap<String, f64> {
        collect_metrics(
            raw,
            &[
                ("like_count", "like_count"),
                ("retweet_count", "retweet_count"),
                ("reply_count", "reply_count"),
            ],
        )
    }
}

pub struct PlayStoreSource;

impl PlatformSource for PlayStoreSource {
    fn platform(&self) -> Platform {
        Platform::PlayStore
    }

    fn text(&self, raw: &RawRecord) -> String {
        raw.str_field("text").unwrap_or("").to_string()
    }

    fn metrics(&self, raw: &RawRecord) -> BTreeMap<String, f64> {
        collect_metrics(raw, &[("rating", "rating"), ("thumbs_up", "thumbs_up")])
    }
}

pub struct AppStoreSource;

impl PlatformSource for AppStoreSource {
    fn platform(&self) -> Platform {
        Platform::AppStore
    }

    fn text(&self, raw: &RawRecord) -> String {
        title_and_text(raw)
    }

    // App Store star ratings arrive as `score`.
    fn metrics(&self, raw: &RawRecord) -> BTreeMap<String, f64> {
        collect_metrics(raw, &[("score", "rating")])
    }
}

/// Extraction rules for a platform.
pub fn source_for(platform: Platform) -> &'static dyn PlatformSource {
    match platform {
        Platform::Reddit => &RedditSource,
        Platform::Twitter => &TwitterSource,
        Platform::PlayStore => &PlayStoreSource,
        Platform::AppStore => &AppStoreSource,
    }
}

/// Parse a timestamp value.
///
/// Accepts RFC 3339, naive ISO-8601 (with `T` or a space, optional
/// fraction, optional offset) read as UTC, and unix seconds as a number or
/// numeric string.
pub fn parse_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::Number(n) => from_unix(n.as_f64()?),
        JsonValue::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn from_unix(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
    Utc.timestamp_opt(whole, nanos.min(999_999_999)).single()
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    s.parse::<f64>().ok().and_then(from_unix)
}

/// Normalize a single raw record.
///
/// Fails with [`Error::MalformedRecord`] when the record has no id, no or
/// an unknown platform tag, or no usable timestamp. The baseline sentiment
/// is left neutral for the scorer to fill.
pub fn normalize_record(raw: &RawRecord) -> Result<Mention> {
    let id = raw
        .id()
        .ok_or_else(|| Error::MalformedRecord("missing id".to_string()))?;

    let tag = raw
        .str_field("platform")
        .ok_or_else(|| Error::MalformedRecord(format!("{}: missing platform tag", id)))?;
    let platform: Platform = tag
        .parse()
        .map_err(|_| Error::MalformedRecord(format!("{}: unknown platform '{}'", id, tag)))?;

    let created_at = ["created_at", "created_utc"]
        .iter()
        .filter_map(|f| raw.get(f))
        .find_map(parse_timestamp)
        .ok_or_else(|| Error::MalformedRecord(format!("{}_{}: missing timestamp", platform, id)))?;

    let source = source_for(platform);
    Ok(Mention {
        id,
        platform,
        created_at,
        text: source.text(raw),
        author: raw.str_field("author").map(str::to_string),
        url: raw.str_field("url").map(str::to_string),
        raw_metrics: source.metrics(raw),
        baseline_sentiment: BaselineSentiment::neutral(),
        enrichment: None,
        search_fields: None,
    })
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    /// Unique mentions, newest first.
    pub mentions: Vec<Mention>,
    pub malformed: usize,
    pub duplicates: usize,
}

/// Normalize and deduplicate all sources into one timeline.
///
/// The first occurrence of a composite key wins; the sort is stable, so
/// records sharing a timestamp keep their input order.
pub fn normalize<I>(sources: I) -> NormalizeReport
where
    I: IntoIterator<Item = Vec<RawRecord>>,
{
    let mut seen: HashSet<MentionKey> = HashSet::new();
    let mut report = NormalizeReport::default();

    for raw in sources.into_iter().flatten() {
        match normalize_record(&raw) {
            Ok(mention) => {
                let key = mention.key();
                if seen.insert(key.clone()) {
                    report.mentions.push(mention);
                } else {
                    trace!(mention_key = %key, "Duplicate record dropped");
                    report.duplicates += 1;
                }
            }
            Err(e) => {
                debug!(error = %e, "Malformed record dropped");
                report.malformed += 1;
            }
        }
    }

    report
        .mentions
        .sort_by(|a, b| b.created_at.cmp(&a.created_at));

    info!(
        subsystem = "pipeline",
        component = "normalizer",
        op = "normalize",
        record_count = report.mentions.len(),
        malformed = report.malformed,
        duplicates = report.duplicates,
        "Normalization complete"
    );
    report
}

/// Load one source file.
///
/// A missing file yields `Ok(None)`; an unreadable file or anything other
/// than a JSON array is [`Error::InvalidDataset`].
pub fn load_raw_file(path: &Path) -> Result<Option<Vec<RawRecord>>> {
    if !path.exists() {
        debug!(path = %path.display(), "Source file absent, skipping");
        return Ok(None);
    }
    let bytes = std::fs::read(path)
        .map_err(|e| Error::InvalidDataset(format!("{}: {}", path.display(), e)))?;
    let records: Vec<RawRecord> = serde_json::from_slice(&bytes).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Source file is not a JSON array");
        Error::InvalidDataset(format!("{}: {}", path.display(), e))
    })?;
    Ok(Some(records))
}

/// Load every `<platform>_raw.json` present in `data_dir`.
pub fn load_sources(data_dir: &Path) -> Result<Vec<Vec<RawRecord>>> {
    let mut sources = Vec::new();
    for platform in Platform::ALL {
        let path = data_dir.join(platform.raw_file_name());
        if let Some(records) = load_raw_file(&path)? {
            debug!(platform = %platform, record_count = records.len(), "Loaded source file");
            sources.push(records);
        }
    }
    Ok(sources)
}
