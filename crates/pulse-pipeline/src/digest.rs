//! Weekly plain-text digest.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use tracing::{info, warn};

use pulse_core::defaults;
use pulse_core::{Mention, Result, SentimentLabel, Topic};
use pulse_inference::prompt::sample_lines;
use pulse_inference::{build_digest_prompt, BackendSelector, BrandContext};

/// Whether a digest should be produced at `now`.
///
/// Digests are produced on Sundays (UTC) or when explicitly requested.
pub fn digest_due(now: DateTime<Utc>, forced: bool) -> bool {
    forced || now.weekday() == Weekday::Sun
}

/// Mentions created within the digest window ending at `now`, and the
/// window's first day.
pub fn digest_window(records: &[Mention], now: DateTime<Utc>) -> (NaiveDate, Vec<Mention>) {
    let since = now - Duration::days(defaults::DIGEST_WINDOW_DAYS);
    let recent = records
        .iter()
        .filter(|m| m.created_at >= since)
        .cloned()
        .collect();
    (since.date_naive(), recent)
}

pub fn digest_header(brand: &str, date: NaiveDate) -> String {
    format!("=== {} Weekly Digest - {} ===\n\n", brand, date.format("%Y-%m-%d"))
}

/// Produce the digest text for `records`.
///
/// Uses the selected backend when one is available and answers; otherwise
/// falls back to a deterministic summary.
pub async fn build_digest(
    selector: &BackendSelector,
    brand: &BrandContext,
    records: &[Mention],
    now: DateTime<Utc>,
) -> String {
    let (since, recent) = digest_window(records, now);
    let header = digest_header(&brand.name, now.date_naive());

    if selector.has_backend() {
        let prompt = build_digest_prompt(brand, &recent, since);
        let outcome = selector.generate_digest(&prompt).await;
        match outcome.result {
            Ok(body) if !body.trim().is_empty() => {
                info!(
                    subsystem = "pipeline",
                    component = "digest",
                    backend = ?outcome.backend_used,
                    record_count = recent.len(),
                    "Digest generated"
                );
                return format!("{}{}\n", header, body.trim());
            }
            Ok(_) => warn!("Digest backend returned empty text, using offline summary"),
            Err(e) => warn!(error = %e, "Digest generation failed, using offline summary"),
        }
    }

    format!("{}{}", header, offline_digest(&recent, since))
}

/// Deterministic digest body built without a backend.
pub fn offline_digest(recent: &[Mention], since: NaiveDate) -> String {
    let mut platforms: BTreeMap<String, usize> = BTreeMap::new();
    for m in recent {
        *platforms.entry(m.platform.to_string()).or_insert(0) += 1;
    }
    let platform_line = if platforms.is_empty() {
        "none".to_string()
    } else {
        platforms
            .iter()
            .map(|(p, c)| format!("{}: {}", p, c))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let count = |label: SentimentLabel| {
        recent
            .iter()
            .filter(|m| m.baseline_sentiment.label == label)
            .count()
    };
    let critical = recent.iter().filter(|m| m.is_critical()).count();

    let topic_is = |m: &Mention, topic: Topic| m.enrichment.as_ref().is_some_and(|e| e.topic == topic);
    let issues: Vec<&Mention> = recent
        .iter()
        .filter(|m| {
            topic_is(m, Topic::BugReport)
                || (!m.is_enriched() && m.baseline_sentiment.label == SentimentLabel::Negative)
        })
        .take(5)
        .collect();
    let loved: Vec<&Mention> = recent
        .iter()
        .filter(|m| {
            topic_is(m, Topic::Praise)
                || (!m.is_enriched() && m.baseline_sentiment.label == SentimentLabel::Positive)
        })
        .take(5)
        .collect();
    let features: Vec<&Mention> = recent
        .iter()
        .filter(|m| topic_is(m, Topic::FeatureRequest))
        .take(5)
        .collect();

    format!(
        "Summary: {} mentions since {} ({}). Critical bugs flagged: {}.\n\
         Baseline sentiment: {} positive, {} neutral, {} negative.\n\n\
         Top issues:\n{}\n\n\
         What users love:\n{}\n\n\
         Feature requests:\n{}\n",
        recent.len(),
        since.format("%Y-%m-%d"),
        platform_line,
        critical,
        count(SentimentLabel::Positive),
        count(SentimentLabel::Neutral),
        count(SentimentLabel::Negative),
        sample_lines(&issues),
        sample_lines(&loved),
        sample_lines(&features),
    )
}

/// Write the digest text into `data_dir`.
pub fn write_digest(data_dir: &Path, text: &str) -> Result<()> {
    let path = data_dir.join(defaults::DIGEST_FILE);
    std::fs::write(&path, text)?;
    info!(path = %path.display(), "Digest written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pulse_core::{BackendKind, BaselineSentiment, Enrichment, LlmSentiment, Platform};
    use pulse_inference::mock::MockBackend;
    use std::sync::Arc;

    fn mention(id: &str, created_at: DateTime<Utc>, text: &str) -> Mention {
        Mention {
            id: id.to_string(),
            platform: Platform::Reddit,
            created_at,
            text: text.to_string(),
            author: None,
            url: None,
            raw_metrics: Default::default(),
            baseline_sentiment: BaselineSentiment::neutral(),
            enrichment: None,
            search_fields: None,
        }
    }

    fn sunday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 8, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_digest_due_on_sunday() {
        assert!(digest_due(sunday(), false));
        assert!(!digest_due(sunday() + Duration::days(1), false));
        assert!(digest_due(sunday() + Duration::days(1), true));
    }

    #[test]
    fn test_digest_window_filters_old_records() {
        let records = vec![
            mention("new", sunday() - Duration::days(2), "a"),
            mention("old", sunday() - Duration::days(9), "b"),
        ];
        let (since, recent) = digest_window(&records, sunday());
        assert_eq!(since, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "new");
    }

    #[test]
    fn test_offline_digest_lists_issues() {
        let mut bug = mention("1", sunday(), "app crashes on level 3");
        bug.enrichment = Some(Enrichment::new(
            9,
            Topic::BugReport,
            LlmSentiment::VeryNegative,
            vec![],
            None,
        ));
        let text = offline_digest(&[bug], NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert!(text.contains("Summary: 1 mentions since 2026-03-01 (reddit: 1). Critical bugs flagged: 1."));
        assert!(text.contains("Top issues:\n- app crashes on level 3"));
        assert!(text.contains("Feature requests:\nNone"));
    }

    #[tokio::test]
    async fn test_build_digest_without_backend_is_offline() {
        let text = build_digest(
            &BackendSelector::none(),
            &BrandContext::default(),
            &[],
            sunday(),
        )
        .await;
        assert!(text.starts_with("=== Matiks Weekly Digest - 2026-03-08 ===\n\nSummary: 0 mentions"));
    }

    #[tokio::test]
    async fn test_build_digest_uses_backend() {
        let backend = MockBackend::new(BackendKind::Local).with_fixed_response("  All quiet this week.  ");
        let selector = BackendSelector::probe(Some(Arc::new(backend.clone())), None).await;
        let text = build_digest(&selector, &BrandContext::default(), &[], sunday()).await;
        assert_eq!(text, "=== Matiks Weekly Digest - 2026-03-08 ===\n\nAll quiet this week.\n");
        assert_eq!(backend.call_count(), 1);
    }
}
