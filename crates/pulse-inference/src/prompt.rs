//! Prompt construction for batch classification and weekly digests.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use pulse_core::defaults;
use pulse_core::{LlmSentiment, Mention, Topic};

/// Brand description embedded in every prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandContext {
    pub name: String,
    /// One-line description of the product.
    pub tagline: String,
    /// Numbered facts and exclusions given to the classifier.
    pub core_context: Vec<String>,
    /// Relevance rubric, highest band first.
    pub relevance_rubric: Vec<String>,
}

impl BrandContext {
    /// Context for a brand name. The default brand carries a curated
    /// disambiguation list; other brands get a generic one.
    pub fn for_brand(name: &str) -> Self {
        let name = name.trim().to_string();
        if name.eq_ignore_ascii_case(defaults::BRAND_NAME) {
            return Self {
                tagline: "an IIT Guwahati startup's math puzzle mobile game".to_string(),
                core_context: vec![
                    format!("{} is a math/brain training app with puzzles, streaks, and levels.", name),
                    "Founded by IIT Guwahati alumni.".to_string(),
                    format!(
                        "IGNORE EVERYTHING ELSE: \"{}\" in Tagalog/Filipino means \"automatic\" (cars, bikes, transmission).",
                        name
                    ),
                    "DELETE ANY POST about Rap Battles, atheism, Philippines politics, or motorcycles. These are 0% relevant.".to_string(),
                ],
                relevance_rubric: vec![
                    "10: Explicitly about the math app, puzzles, IIT, or app store feedback.".to_string(),
                    format!("7-9: Mentions \"{}\" app in a general gaming or productivity context.", name),
                    "3-6: Ambiguous mentions.".to_string(),
                    "0-2: Definitely motorcycles, cars, Tagalog slang, rap battles, or atheist posts.".to_string(),
                ],
                name,
            };
        }

        Self {
            tagline: "a mobile app".to_string(),
            core_context: vec![
                format!("{} is the product being monitored.", name),
                format!("IGNORE posts where \"{}\" refers to anything other than the product.", name),
            ],
            relevance_rubric: vec![
                "10: Explicitly about the app or its store listing feedback.".to_string(),
                format!("7-9: Mentions \"{}\" the app in a general context.", name),
                "3-6: Ambiguous mentions.".to_string(),
                "0-2: Clearly about something else.".to_string(),
            ],
            name,
        }
    }
}

impl Default for BrandContext {
    fn default() -> Self {
        Self::for_brand(defaults::BRAND_NAME)
    }
}

/// Prefix of the line that introduces each numbered record.
const RECORD_MARKER: &str = ". [platform=";

/// Leading `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the classification prompt for one batch.
///
/// Records are numbered from 1 in batch order, tagged with their platform,
/// and truncated; the model is asked for a JSON array of the same length.
pub fn build_batch_prompt(brand: &BrandContext, batch: &[Mention]) -> String {
    let records_block = batch
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let text = truncate_chars(m.text.trim(), defaults::MAX_PROMPT_TEXT_CHARS);
            format!("{}{}{}] \"\"\"{}\"\"\"", i + 1, RECORD_MARKER, m.platform, text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let core = numbered(&brand.core_context);
    let rubric = brand
        .relevance_rubric
        .iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a brand relevance classifier for "{name}", {tagline}.

CORE CONTEXT:
{core}

RELEVANCE SCORING (0-10):
{rubric}

For each numbered post, return a JSON array of {count} objects:
- "relevance": integer 0-10
- "topic": bug_report | feature_request | praise | question | competitor_comparison | general | irrelevant
  (If relevance < {min}, topic MUST be "irrelevant")
- "llm_sentiment": very_negative | negative | mixed | positive | very_positive
- "key_phrases": array of 3 meaningful phrases
- "is_critical": true ONLY if topic=bug_report AND llm_sentiment=very_negative

Return ONLY the raw JSON array, no explanation, no markdown fences.

Posts:
{records_block}
"#,
        name = brand.name,
        tagline = brand.tagline,
        count = batch.len(),
        min = defaults::RELEVANCE_MIN,
    )
}

/// Number of records a batch prompt asks the model to classify.
pub fn count_prompt_records(prompt: &str) -> usize {
    prompt
        .lines()
        .filter(|line| {
            line.split_once(RECORD_MARKER)
                .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .count()
}

/// Build the weekly digest prompt from the week's mentions.
pub fn build_digest_prompt(brand: &BrandContext, records: &[Mention], since: NaiveDate) -> String {
    let with_sentiment = |wanted: &[LlmSentiment]| -> Vec<&Mention> {
        records
            .iter()
            .filter(|m| {
                m.enrichment
                    .as_ref()
                    .is_some_and(|e| wanted.contains(&e.llm_sentiment))
            })
            .take(10)
            .collect()
    };
    let with_topic = |wanted: Topic| -> Vec<&Mention> {
        records
            .iter()
            .filter(|m| m.enrichment.as_ref().is_some_and(|e| e.topic == wanted))
            .take(5)
            .collect()
    };

    let negatives = with_sentiment(&[LlmSentiment::VeryNegative, LlmSentiment::Negative]);
    let positives = with_sentiment(&[LlmSentiment::VeryPositive, LlmSentiment::Positive]);
    let bugs = with_topic(Topic::BugReport);
    let features = with_topic(Topic::FeatureRequest);

    let mut platform_counts: BTreeMap<String, usize> = BTreeMap::new();
    for m in records {
        *platform_counts.entry(m.platform.to_string()).or_insert(0) += 1;
    }
    let platforms = platform_counts
        .iter()
        .map(|(p, c)| format!("{}: {}", p, c))
        .collect::<Vec<_>>()
        .join(", ");
    let critical = records.iter().filter(|m| m.is_critical()).count();

    format!(
        r#"You are writing a weekly monitoring digest for "{name}", {tagline}.

Data from {since} to today:
- Total mentions: {total}
- By platform: {platforms}
- Critical bugs flagged: {critical}

Top negative mentions:
{negatives}

Top positive mentions:
{positives}

Bug reports:
{bugs}

Feature requests:
{features}

Write a concise weekly digest (max 300 words) for the {name} team covering:
1. Executive summary (2 sentences)
2. Top issues to fix this week
3. What users love (keep doing this)
4. Feature requests to consider
5. One recommendation

Write in plain text, no markdown, professional tone.
"#,
        name = brand.name,
        tagline = brand.tagline,
        since = since.format("%Y-%m-%d"),
        total = records.len(),
        negatives = sample_lines(&negatives),
        positives = sample_lines(&positives),
        bugs = sample_lines(&bugs),
        features = sample_lines(&features),
    )
}

/// Bulleted excerpts, or "None".
pub fn sample_lines(mentions: &[&Mention]) -> String {
    if mentions.is_empty() {
        return "None".to_string();
    }
    mentions
        .iter()
        .map(|m| format!("- {}", truncate_chars(m.text.trim(), 120)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}
