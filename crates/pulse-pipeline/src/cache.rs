//! Enrichment cache built from the previous run's enriched dataset.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use pulse_core::{Dataset, Mention, MentionKey};
use pulse_search::{score_search_fields, SearchConfig};

/// Previous results keyed by composite key. Read-only for the run.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentCache {
    entries: HashMap<MentionKey, Mention>,
}

/// Candidates split by whether they still need classification.
#[derive(Debug, Clone, Default)]
pub struct CacheDiff {
    /// Absent from the cache, or cached without a complete enrichment.
    pub to_enrich: Vec<Mention>,
    /// Cached with a complete enrichment; carried forward verbatim.
    pub already_done: Vec<Mention>,
    /// Candidate order of every key in either list.
    pub order: Vec<MentionKey>,
}

impl EnrichmentCache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = Mention>) -> Self {
        Self {
            entries: records.into_iter().map(|m| (m.key(), m)).collect(),
        }
    }

    /// Load the cache from an enriched dataset file.
    ///
    /// A missing file is an empty cache. An unreadable or corrupt file is
    /// also treated as empty, with a warning, so the run re-enriches rather
    /// than aborting.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No previous enriched dataset");
            return Self::empty();
        }

        let parsed = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice::<Dataset>(&bytes).map_err(|e| e.to_string()));

        match parsed {
            Ok(dataset) => {
                let cache = Self::from_records(dataset.records);
                info!(
                    subsystem = "pipeline",
                    component = "cache",
                    op = "load",
                    record_count = cache.len(),
                    enriched = cache.enriched_count(),
                    "Enrichment cache loaded"
                );
                cache
            }
            Err(e) => {
                warn!(
                    subsystem = "pipeline",
                    component = "cache",
                    path = %path.display(),
                    error = %e,
                    "Previous enriched dataset unreadable, starting with empty cache"
                );
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enriched_count(&self) -> usize {
        self.entries.values().filter(|m| m.is_enriched()).count()
    }

    pub fn get(&self, key: &MentionKey) -> Option<&Mention> {
        self.entries.get(key)
    }

    /// Split fresh candidates against the cache.
    ///
    /// Enriched cache entries replace their candidate unchanged. Unenriched
    /// entries donate their `search_fields` to a candidate that has none.
    pub fn diff(&self, candidates: Vec<Mention>) -> CacheDiff {
        let mut diff = CacheDiff::default();

        for mut candidate in candidates {
            let key = candidate.key();
            match self.entries.get(&key) {
                Some(cached) if cached.is_enriched() => {
                    diff.already_done.push(cached.clone());
                }
                Some(cached) => {
                    if candidate.search_fields.is_none() {
                        candidate.search_fields = cached.search_fields;
                    }
                    diff.to_enrich.push(candidate);
                }
                None => diff.to_enrich.push(candidate),
            }
            diff.order.push(key);
        }

        info!(
            subsystem = "pipeline",
            component = "cache",
            op = "diff",
            to_enrich = diff.to_enrich.len(),
            already_done = diff.already_done.len(),
            "Cache diff complete"
        );
        diff
    }
}

impl CacheDiff {
    /// Fill missing search fields over the whole candidate corpus.
    ///
    /// Scoring runs in candidate order so near-duplicate flags do not
    /// depend on how the corpus was split.
    pub fn score_search_fields(&mut self, config: &SearchConfig) -> usize {
        let parts = std::mem::take(&mut self.already_done)
            .into_iter()
            .chain(std::mem::take(&mut self.to_enrich));
        let mut corpus = merge_in_order(&self.order, parts);
        let scored = score_search_fields(&mut corpus, config);

        let (done, todo): (Vec<_>, Vec<_>) = corpus.into_iter().partition(Mention::is_enriched);
        self.already_done = done;
        self.to_enrich = todo;
        scored
    }

    /// Every candidate in candidate order, with enrichment stripped.
    pub fn merged_view(&self) -> Vec<Mention> {
        let parts = self
            .already_done
            .iter()
            .chain(self.to_enrich.iter())
            .cloned()
            .map(|mut m| {
                m.enrichment = None;
                m
            });
        merge_in_order(&self.order, parts)
    }
}

/// Arrange mentions in `order`, later parts replacing earlier ones with the
/// same key, then stable-sort newest first. Keys absent from `order` are
/// dropped.
pub fn merge_in_order<I>(order: &[MentionKey], parts: I) -> Vec<Mention>
where
    I: IntoIterator<Item = Mention>,
{
    let mut by_key: HashMap<MentionKey, Mention> = HashMap::new();
    for mention in parts {
        by_key.insert(mention.key(), mention);
    }

    let mut merged: Vec<Mention> = order.iter().filter_map(|k| by_key.remove(k)).collect();
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pulse_core::{BaselineSentiment, Enrichment, LlmSentiment, Platform, SearchFields, Topic};

    fn mention(id: &str, day: u32) -> Mention {
        Mention {
            id: id.to_string(),
            platform: Platform::Reddit,
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap(),
            text: format!("text {}", id),
            author: None,
            url: None,
            raw_metrics: Default::default(),
            baseline_sentiment: BaselineSentiment::neutral(),
            enrichment: None,
            search_fields: None,
        }
    }

    fn enriched(id: &str, day: u32) -> Mention {
        let mut m = mention(id, day);
        m.enrichment = Some(Enrichment::new(
            9,
            Topic::Praise,
            LlmSentiment::Positive,
            vec!["fun".into()],
            None,
        ));
        m
    }

    #[test]
    fn test_diff_splits_by_enrichment() {
        let mut stale = mention("b", 2);
        stale.search_fields = Some(SearchFields {
            bm25_score: 1.5,
            is_near_duplicate: false,
            fuzzy_brand_match: true,
        });
        let cache = EnrichmentCache::from_records(vec![enriched("a", 3), stale]);

        let diff = cache.diff(vec![mention("a", 3), mention("b", 2), mention("c", 1)]);
        assert_eq!(diff.already_done.len(), 1);
        assert!(diff.already_done[0].is_enriched());
        assert_eq!(diff.to_enrich.len(), 2);
        assert_eq!(diff.to_enrich[0].search_fields.map(|f| f.bm25_score), Some(1.5));
        assert!(diff.to_enrich[1].search_fields.is_none());
        assert_eq!(diff.order.len(), 3);
    }

    #[test]
    fn test_merge_in_order_later_parts_win() {
        let order = vec![mention("x", 2).key(), mention("y", 1).key()];
        let merged = merge_in_order(&order, vec![mention("y", 1), mention("x", 2), enriched("y", 1)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "x");
        assert!(merged[1].is_enriched());
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mentions_enriched.json");
        assert!(EnrichmentCache::load(&path).is_empty());

        std::fs::write(&path, "{ truncated").unwrap();
        assert!(EnrichmentCache::load(&path).is_empty());
    }

    #[test]
    fn test_merged_view_strips_enrichment() {
        let cache = EnrichmentCache::from_records(vec![enriched("a", 3)]);
        let diff = cache.diff(vec![mention("a", 3), mention("b", 4)]);
        let view = diff.merged_view();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].id, "b");
        assert!(view.iter().all(|m| m.enrichment.is_none()));
    }
}
