//! Word tokenizer shared by the scoring algorithms.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Function words excluded from every token stream.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "it", "in", "on", "at", "to", "for", "of", "and", "or", "but",
        "with", "this", "that", "are", "was", "be", "have", "has", "had", "not", "do", "does",
        "did", "will", "can", "i", "you", "he", "she", "we", "they", "my", "your", "its",
        "their", "so", "as", "by", "from", "up", "out", "if", "about", "than", "then", "just",
        "like", "more", "also",
    ]
    .into_iter()
    .collect()
});

/// Whether `word` is a stop-word.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Lowercase `text`, split on whitespace and ASCII punctuation, and drop
/// stop-words and single-character tokens.
///
/// Punctuation separates words, so `hello.world` yields two tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|w| w.chars().count() > 1 && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits_punctuation() {
        assert_eq!(tokenize("Hello.World"), vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        assert_eq!(
            tokenize("I think the Matiks app is a 10/10 x"),
            vec!["think", "matiks", "app", "10", "10"]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ... !!! ").is_empty());
    }

    #[test]
    fn test_is_stopword() {
        assert!(is_stopword("the"));
        assert!(!is_stopword("matiks"));
    }
}
