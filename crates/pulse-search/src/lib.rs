//! # pulse-search
//!
//! Offline scoring for mention-pulse. Nothing here performs I/O.
//!
//! This crate provides:
//! - Lexicon (VADER-style) baseline sentiment for every mention
//! - BM25 relevance against a brand reference query
//! - TF-IDF cosine near-duplicate detection within a platform
//! - Fuzzy brand-name matching tolerant of one-edit misspellings
//! - Brand keyword co-occurrence for the word-cloud view

pub mod bm25;
pub mod cooccurrence;
pub mod fuzzy;
pub mod lexicon;
pub mod near_duplicate;
pub mod scorer;
pub mod sentiment;
pub mod tokenizer;

pub use bm25::Bm25;
pub use cooccurrence::brand_cooccurrence;
pub use fuzzy::contains_brand_variant;
pub use near_duplicate::find_near_duplicates;
pub use scorer::{score_search_fields, word_cloud, SearchConfig};
pub use sentiment::analyze as analyze_sentiment;
pub use tokenizer::tokenize;
