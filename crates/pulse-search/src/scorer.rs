//! Corpus-level search scoring for mentions.

use tracing::debug;

use pulse_core::defaults;
use pulse_core::{Mention, Platform, SearchFields, WordCloudEntry};

use crate::bm25::Bm25;
use crate::cooccurrence::brand_cooccurrence;
use crate::fuzzy::contains_brand_variant;
use crate::near_duplicate::find_near_duplicates;
use crate::tokenizer::tokenize;

/// Brand-specific scoring configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Lowercase brand term used for co-occurrence.
    pub brand_term: String,
    /// Reference document BM25 scores against.
    pub reference_query: String,
    /// Accepted spellings for fuzzy matching.
    pub brand_variants: Vec<String>,
    pub near_duplicate_threshold: f64,
    pub fuzzy_max_distance: usize,
    pub word_cloud_top_n: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::for_brand(defaults::BRAND_NAME)
    }
}

impl SearchConfig {
    /// Configuration for a brand name.
    ///
    /// The default brand uses its curated reference query and misspelling
    /// list; any other brand substitutes its own name into the reference
    /// query and matches only that spelling.
    pub fn for_brand(name: &str) -> Self {
        let brand_term = name.trim().to_lowercase();
        let default_term = defaults::BRAND_NAME.to_lowercase();

        let (reference_query, brand_variants) = if brand_term == default_term {
            (
                defaults::BRAND_REFERENCE.to_string(),
                defaults::BRAND_VARIANTS.iter().map(|v| v.to_string()).collect(),
            )
        } else {
            (
                defaults::BRAND_REFERENCE.replace(&default_term, &brand_term),
                vec![brand_term.clone()],
            )
        };

        Self {
            brand_term,
            reference_query,
            brand_variants,
            near_duplicate_threshold: defaults::NEAR_DUPLICATE_THRESHOLD,
            fuzzy_max_distance: defaults::FUZZY_MAX_DISTANCE,
            word_cloud_top_n: defaults::WORD_CLOUD_TOP_N,
        }
    }
}

/// Populate `search_fields` on every mention that lacks them.
///
/// Corpus statistics (BM25 document frequencies, TF-IDF weights) are built
/// over the whole slice so scores are comparable across mentions; mentions
/// that already carry fields are left untouched. Returns the number of
/// mentions scored.
pub fn score_search_fields(mentions: &mut [Mention], config: &SearchConfig) -> usize {
    if mentions.iter().all(|m| m.search_fields.is_some()) {
        return 0;
    }

    let corpus: Vec<Vec<String>> = mentions.iter().map(|m| tokenize(&m.text)).collect();
    let platforms: Vec<Platform> = mentions.iter().map(|m| m.platform).collect();

    let bm25 = Bm25::new(&corpus);
    let query = tokenize(&config.reference_query);
    let duplicates = find_near_duplicates(&corpus, &platforms, config.near_duplicate_threshold);

    let mut scored = 0;
    for (idx, mention) in mentions.iter_mut().enumerate() {
        if mention.search_fields.is_some() {
            continue;
        }
        mention.search_fields = Some(SearchFields {
            bm25_score: bm25.score(&query, &corpus[idx]),
            is_near_duplicate: duplicates[idx],
            fuzzy_brand_match: contains_brand_variant(
                &mention.text,
                &config.brand_variants,
                config.fuzzy_max_distance,
            ),
        });
        scored += 1;
    }

    debug!(
        subsystem = "search",
        component = "scorer",
        op = "score_search_fields",
        record_count = mentions.len(),
        scored,
        near_duplicates = duplicates.iter().filter(|d| **d).count(),
        "Search fields computed"
    );
    scored
}

/// Terms that co-occur with the brand across `mentions`.
pub fn word_cloud(mentions: &[Mention], config: &SearchConfig) -> Vec<WordCloudEntry> {
    brand_cooccurrence(
        mentions.iter().map(|m| m.text.as_str()),
        &config.brand_term,
        config.word_cloud_top_n,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_curated_variants() {
        let config = SearchConfig::default();
        assert_eq!(config.brand_term, "matiks");
        assert!(config.brand_variants.contains(&"mattiks".to_string()));
        assert!(config.reference_query.contains("leaderboard"));
    }

    #[test]
    fn test_custom_brand_substitutes_reference() {
        let config = SearchConfig::for_brand("Numbrix");
        assert_eq!(config.brand_variants, vec!["numbrix".to_string()]);
        assert!(config.reference_query.starts_with("numbrix app"));
        assert!(!config.reference_query.contains("matiks"));
    }
}
