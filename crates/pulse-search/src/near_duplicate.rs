//! TF-IDF cosine near-duplicate detection.
//!
//! Reposts across platforms are legitimate, so only records sharing a
//! platform are compared. Within a platform the earliest record in input
//! order is kept and later look-alikes are flagged.

use std::collections::{HashMap, HashSet};

use pulse_core::Platform;

/// Sparse TF-IDF vector keyed by term.
type TermVector = HashMap<String, f64>;

/// Build TF-IDF vectors using `idf = ln((n + 1) / (df + 1))`.
fn tfidf_vectors(docs: &[Vec<String>]) -> Vec<TermVector> {
    let n = docs.len() as f64;
    let mut df: HashMap<&str, usize> = HashMap::new();
    for doc in docs {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            *df.entry(term).or_insert(0) += 1;
        }
    }

    docs.iter()
        .map(|doc| {
            let dl = doc.len().max(1) as f64;
            let mut tf: HashMap<&str, usize> = HashMap::new();
            for term in doc {
                *tf.entry(term.as_str()).or_insert(0) += 1;
            }
            tf.into_iter()
                .map(|(term, count)| {
                    let idf = ((n + 1.0) / (df[term] as f64 + 1.0)).ln();
                    (term.to_string(), (count as f64 / dl) * idf)
                })
                .collect()
        })
        .collect()
}

/// Cosine similarity of two sparse vectors; 0 when they share no term.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    if dot == 0.0 {
        return 0.0;
    }
    let mag_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    dot / (mag_a * mag_b + 1e-9)
}

/// Flag documents that are near-duplicates of an earlier document on the
/// same platform.
///
/// `docs` and `platforms` are parallel. Returns one flag per document.
pub fn find_near_duplicates(docs: &[Vec<String>], platforms: &[Platform], threshold: f64) -> Vec<bool> {
    let vectors = tfidf_vectors(docs);
    let mut flagged = vec![false; docs.len()];

    let mut by_platform: HashMap<Platform, Vec<usize>> = HashMap::new();
    for (idx, platform) in platforms.iter().enumerate().take(docs.len()) {
        by_platform.entry(*platform).or_default().push(idx);
    }

    for indices in by_platform.values() {
        for (pos, &i) in indices.iter().enumerate() {
            if flagged[i] {
                continue;
            }
            for &j in &indices[pos + 1..] {
                if flagged[j] {
                    continue;
                }
                if cosine_similarity(&vectors[i], &vectors[j]) >= threshold {
                    flagged[j] = true;
                }
            }
        }
    }

    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use pulse_core::defaults::NEAR_DUPLICATE_THRESHOLD;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts.iter().map(|t| tokenize(t)).collect()
    }

    #[test]
    fn test_later_copy_on_same_platform_flagged() {
        let d = docs(&[
            "matiks crashes when opening the leaderboard screen",
            "matiks crashes when opening the leaderboard screen!!",
            "completely different review about puzzles",
        ]);
        let platforms = [Platform::PlayStore; 3];
        let flags = find_near_duplicates(&d, &platforms, NEAR_DUPLICATE_THRESHOLD);
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_cross_platform_copies_not_flagged() {
        let d = docs(&[
            "matiks crashes when opening the leaderboard screen",
            "matiks crashes when opening the leaderboard screen",
            "unrelated chatter about weather",
        ]);
        let platforms = [Platform::Reddit, Platform::Twitter, Platform::Reddit];
        let flags = find_near_duplicates(&d, &platforms, NEAR_DUPLICATE_THRESHOLD);
        assert_eq!(flags, vec![false, false, false]);
    }

    #[test]
    fn test_cosine_disjoint_is_zero() {
        let d = docs(&["alpha beta", "gamma delta", "epsilon"]);
        let v = tfidf_vectors(&d);
        assert_eq!(cosine_similarity(&v[0], &v[1]), 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(find_near_duplicates(&[], &[], NEAR_DUPLICATE_THRESHOLD).is_empty());
    }
}
