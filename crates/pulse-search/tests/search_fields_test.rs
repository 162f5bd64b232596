/// Corpus-level scoring of mentions: relevance, duplicates, brand matching.
use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use pulse_core::{BaselineSentiment, Mention, Platform, SearchFields};
use pulse_search::{analyze_sentiment, score_search_fields, word_cloud, SearchConfig};

fn mention(id: &str, platform: Platform, text: &str) -> Mention {
    Mention {
        id: id.to_string(),
        platform,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        text: text.to_string(),
        author: None,
        url: None,
        raw_metrics: BTreeMap::new(),
        baseline_sentiment: analyze_sentiment(text),
        enrichment: None,
        search_fields: None,
    }
}

#[test]
fn test_scores_populate_every_unscored_mention() {
    let mut mentions = vec![
        mention("1", Platform::Reddit, "Matiks math puzzle game has a great leaderboard"),
        mention("2", Platform::Reddit, "Matiks math puzzle game has a great leaderboard!"),
        mention("3", Platform::Twitter, "just had lunch with friends"),
        mention("4", Platform::PlayStore, "Mattiks keeps crashing after the update"),
    ];

    let config = SearchConfig::default();
    let scored = score_search_fields(&mut mentions, &config);
    assert_eq!(scored, 4);

    let fields: Vec<SearchFields> = mentions.iter().map(|m| m.search_fields.unwrap()).collect();
    assert!(fields[0].bm25_score > fields[2].bm25_score);
    assert!(!fields[0].is_near_duplicate);
    assert!(fields[1].is_near_duplicate);
    assert!(!fields[2].fuzzy_brand_match);
    assert!(fields[3].fuzzy_brand_match);
}

#[test]
fn test_existing_fields_are_kept() {
    let kept = SearchFields {
        bm25_score: 42.0,
        is_near_duplicate: false,
        fuzzy_brand_match: true,
    };
    let mut first = mention("1", Platform::Reddit, "matiks is fun");
    first.search_fields = Some(kept);
    let mut mentions = vec![first, mention("2", Platform::Reddit, "matiks levels")];

    let scored = score_search_fields(&mut mentions, &SearchConfig::default());
    assert_eq!(scored, 1);
    assert_eq!(mentions[0].search_fields, Some(kept));
    assert!(mentions[1].search_fields.is_some());

    assert_eq!(score_search_fields(&mut mentions, &SearchConfig::default()), 0);
}

#[test]
fn test_word_cloud_from_mentions() {
    let mentions = vec![
        mention("1", Platform::Reddit, "matiks leaderboard rocks"),
        mention("2", Platform::AppStore, "Matiks leaderboard broken"),
        mention("3", Platform::Twitter, "leaderboard for chess"),
    ];
    let cloud = word_cloud(&mentions, &SearchConfig::default());
    assert_eq!(cloud[0].term, "leaderboard");
    assert_eq!(cloud[0].count, 2);
}
