//! Okapi BM25 relevance scoring against a reference query.

use std::collections::{HashMap, HashSet};

use pulse_core::defaults::{BM25_B, BM25_K1};

/// Document statistics for a tokenized corpus.
#[derive(Debug, Clone)]
pub struct Bm25 {
    n: usize,
    avgdl: f64,
    df: HashMap<String, usize>,
}

impl Bm25 {
    /// Build corpus statistics from tokenized documents.
    pub fn new(corpus: &[Vec<String>]) -> Self {
        let n = corpus.len();
        let total: usize = corpus.iter().map(Vec::len).sum();
        let avgdl = total as f64 / n.max(1) as f64;

        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let unique: HashSet<&String> = doc.iter().collect();
            for term in unique {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }

        Self { n, avgdl, df }
    }

    /// Score one document against the query, rounded to 4 decimals.
    ///
    /// Query terms absent from the corpus contribute nothing.
    pub fn score(&self, query: &[String], doc: &[String]) -> f64 {
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for term in doc {
            *tf.entry(term.as_str()).or_insert(0) += 1;
        }
        let dl = doc.len() as f64;

        let mut score = 0.0;
        for term in query {
            let Some(&df) = self.df.get(term) else {
                continue;
            };
            let df = df as f64;
            let idf = ((self.n as f64 - df + 0.5) / (df + 0.5) + 1.0).ln();
            let freq = tf.get(term.as_str()).copied().unwrap_or(0) as f64;
            let numerator = freq * (BM25_K1 + 1.0);
            let denominator = freq + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / self.avgdl);
            score += idf * (numerator / denominator);
        }
        round4(score)
    }
}

pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
