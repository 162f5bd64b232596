//! Fuzzy brand-name matching that tolerates common misspellings.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words of at least four characters; shorter words collide with too much noise.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{4,}\b").expect("valid regex"));

/// Whether `text` contains a word within `max_distance` edits of any variant.
pub fn contains_brand_variant(text: &str, variants: &[String], max_distance: usize) -> bool {
    let lowered = text.to_lowercase();
    WORD_RE.find_iter(&lowered).any(|m| {
        let word = m.as_str();
        let word_len = word.chars().count();
        variants.iter().any(|variant| {
            word_len.abs_diff(variant.chars().count()) <= max_distance
                && strsim::levenshtein(word, variant) <= max_distance
        })
    })
}
