//! Keyword co-occurrence with the brand name (word-cloud view).

use std::collections::HashMap;

use pulse_core::WordCloudEntry;

use crate::tokenizer::tokenize;

/// Count terms across texts that mention `brand_term`.
///
/// Only tokens longer than three characters count, and the brand term itself
/// is excluded. Returns the `top_n` terms by count, ties broken
/// alphabetically so the output is stable.
pub fn brand_cooccurrence<'a, I>(texts: I, brand_term: &str, top_n: usize) -> Vec<WordCloudEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let brand = brand_term.to_lowercase();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for text in texts {
        let lowered = text.to_lowercase();
        if !lowered.contains(&brand) {
            continue;
        }
        for token in tokenize(&lowered) {
            if token != brand && token.chars().count() > 3 {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
    }

    let mut entries: Vec<WordCloudEntry> = counts
        .into_iter()
        .map(|(term, count)| WordCloudEntry { term, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    entries.truncate(top_n);
    entries
}
