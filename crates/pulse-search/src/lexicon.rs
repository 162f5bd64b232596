//! Valence lexicon, booster words and negations for the sentiment scorer.
//!
//! Valences follow the VADER convention: a mean human rating on a
//! `-4..=4` scale.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Intensity added by a booster word.
pub const BOOST_INCR: f64 = 0.293;

/// Intensity removed by a dampener word.
pub const BOOST_DECR: f64 = -0.293;

/// Intensity added by an ALL-CAPS sentiment word in mixed-case text.
pub const CAPS_INCR: f64 = 0.733;

/// Multiplier applied to a negated valence.
pub const NEGATION_SCALAR: f64 = -0.74;

#[rustfmt::skip]
const WORD_VALENCES: &[(&str, f64)] = &[
    // positive
    ("addictive", 1.0), ("adorable", 2.2), ("amazing", 2.8), ("amazed", 2.2),
    ("appreciate", 2.0), ("appreciated", 2.3), ("awesome", 3.1), ("beautiful", 2.9),
    ("best", 3.2), ("better", 1.9), ("brilliant", 2.8), ("calm", 1.3),
    ("challenging", 0.6), ("charming", 2.8), ("cheerful", 2.5), ("clean", 1.7),
    ("clever", 2.0), ("comfortable", 1.5), ("cool", 1.3), ("competitive", 0.9),
    ("delight", 2.9), ("delighted", 2.8), ("easy", 1.9), ("effective", 2.1),
    ("elegant", 2.1), ("engaging", 1.4), ("enjoy", 2.2), ("enjoyable", 1.9),
    ("enjoyed", 2.3), ("enjoying", 2.4), ("excellent", 2.7), ("excited", 1.4),
    ("exciting", 2.2), ("fab", 2.0), ("fabulous", 2.4), ("fair", 1.3),
    ("fantastic", 2.6), ("favorite", 2.0), ("favourite", 2.0), ("fine", 0.8),
    ("fixed", 1.1), ("free", 2.3), ("fresh", 1.3), ("friendly", 2.2),
    ("fun", 2.3), ("funny", 1.9), ("genius", 1.9), ("glad", 2.0),
    ("good", 1.9), ("gorgeous", 3.0), ("great", 3.1), ("happy", 2.7),
    ("helpful", 1.8), ("hooked", 0.8), ("hope", 1.9),
    ("impressed", 2.1), ("impressive", 2.3), ("incredible", 2.6), ("innovative", 1.9),
    ("interesting", 1.7), ("intuitive", 1.5), ("kind", 2.4), ("lol", 1.8),
    ("love", 3.2), ("loved", 2.9), ("lovely", 2.8), ("loves", 2.7),
    ("loving", 2.9), ("lucky", 1.8), ("magnificent", 3.0), ("masterpiece", 3.1),
    ("neat", 2.0), ("nice", 1.8), ("outstanding", 3.0), ("perfect", 2.7),
    ("pleasant", 2.3), ("pleased", 1.9), ("polished", 1.6), ("popular", 1.8),
    ("positive", 2.6), ("pretty", 2.2), ("proud", 2.1), ("recommend", 1.5),
    ("recommended", 1.6), ("relaxing", 2.2), ("reliable", 1.9), ("rewarding", 2.4),
    ("satisfied", 1.8), ("satisfying", 2.0), ("smart", 1.7), ("smooth", 1.2),
    ("solid", 1.2), ("success", 2.7), ("successful", 2.8), ("super", 2.9),
    ("superb", 3.1), ("sweet", 2.0), ("thank", 1.5), ("thanks", 1.9),
    ("thrilled", 2.6), ("top", 0.8), ("useful", 1.9), ("win", 2.8),
    ("winner", 2.8), ("winning", 2.4), ("wonderful", 2.7), ("worth", 0.9),
    ("wow", 2.8), ("yay", 2.4), ("yes", 1.7),
    // negative
    ("abandon", -1.9), ("addicted", -0.9), ("angry", -2.3), ("annoyed", -1.6),
    ("annoying", -1.7), ("anxious", -1.0), ("awful", -2.0), ("bad", -2.5),
    ("boring", -1.3), ("broke", -1.8), ("broken", -2.1), ("bug", -1.2),
    ("buggy", -1.6), ("bugs", -1.2), ("cheat", -2.0), ("cheater", -2.5),
    ("cheating", -2.0), ("confused", -1.3), ("confusing", -1.3), ("crap", -1.6),
    ("crash", -1.7), ("crashed", -1.6), ("crashes", -1.7), ("crashing", -1.7),
    ("dead", -3.3), ("delete", -0.8), ("deleted", -0.8), ("disappointed", -1.9),
    ("disappointing", -2.2), ("disappointment", -2.3), ("dislike", -1.6), ("disgusting", -2.4),
    ("dumb", -2.3), ("error", -1.7), ("errors", -1.4), ("expensive", -0.9),
    ("fail", -2.5), ("failed", -2.3), ("failing", -2.3), ("fails", -1.8),
    ("failure", -2.3), ("fake", -2.1), ("fraud", -2.8), ("freeze", -0.6),
    ("freezes", -0.6), ("frustrated", -2.4), ("frustrating", -1.9), ("frustration", -2.1),
    ("garbage", -2.0), ("glitch", -1.1), ("glitches", -1.1), ("glitchy", -1.2),
    ("hate", -2.7), ("hated", -3.2), ("hates", -1.9), ("horrible", -2.5),
    ("ugly", -2.3), ("issue", -0.4), ("issues", -0.4), ("junk", -1.4),
    ("lag", -0.9), ("laggy", -1.3), ("lame", -1.8), ("lose", -1.7),
    ("losing", -1.6), ("lost", -1.3), ("mad", -2.2), ("mess", -1.5),
    ("miss", -0.6), ("missing", -1.2), ("mistake", -1.4), ("negative", -2.7),
    ("pathetic", -2.2), ("poor", -2.1), ("problem", -1.7), ("problems", -1.7),
    ("refund", -0.5), ("ridiculous", -1.5), ("sad", -2.1), ("scam", -2.7),
    ("slow", -0.7), ("sorry", -0.3), ("spam", -1.5), ("stuck", -1.0),
    ("stupid", -2.4), ("sucks", -1.5), ("terrible", -2.1), ("trash", -2.7),
    ("unfair", -2.1), ("uninstall", -1.1), ("uninstalled", -1.1), ("unplayable", -2.0),
    ("unusable", -1.8), ("upset", -1.6), ("useless", -1.8), ("waste", -1.8),
    ("wasted", -2.2), ("weak", -1.9), ("worse", -2.1), ("worst", -3.1),
    ("worthless", -1.9), ("wrong", -2.1), ("wtf", -2.8),
];

#[rustfmt::skip]
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOST_INCR), ("amazingly", BOOST_INCR), ("completely", BOOST_INCR),
    ("considerably", BOOST_INCR), ("decidedly", BOOST_INCR), ("deeply", BOOST_INCR),
    ("enormously", BOOST_INCR), ("entirely", BOOST_INCR), ("especially", BOOST_INCR),
    ("exceptionally", BOOST_INCR), ("extremely", BOOST_INCR), ("fully", BOOST_INCR),
    ("greatly", BOOST_INCR), ("hella", BOOST_INCR), ("hugely", BOOST_INCR),
    ("incredibly", BOOST_INCR), ("intensely", BOOST_INCR), ("majorly", BOOST_INCR),
    ("more", BOOST_INCR), ("most", BOOST_INCR), ("particularly", BOOST_INCR),
    ("purely", BOOST_INCR), ("quite", BOOST_INCR), ("really", BOOST_INCR),
    ("remarkably", BOOST_INCR), ("so", BOOST_INCR), ("substantially", BOOST_INCR),
    ("thoroughly", BOOST_INCR), ("totally", BOOST_INCR), ("tremendously", BOOST_INCR),
    ("truly", BOOST_INCR), ("unbelievably", BOOST_INCR), ("very", BOOST_INCR),
    ("almost", BOOST_DECR), ("barely", BOOST_DECR), ("hardly", BOOST_DECR),
    ("kinda", BOOST_DECR), ("less", BOOST_DECR), ("little", BOOST_DECR),
    ("marginally", BOOST_DECR), ("occasionally", BOOST_DECR), ("partly", BOOST_DECR),
    ("scarcely", BOOST_DECR), ("slightly", BOOST_DECR), ("somewhat", BOOST_DECR),
    ("sorta", BOOST_DECR),
];

#[rustfmt::skip]
const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt",
    "ain't", "aren't", "can't", "couldn't", "daren't", "didn't", "doesn't",
    "dont", "hadnt", "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither",
    "don't", "hadn't", "hasn't", "haven't", "isn't", "mightn't", "mustn't",
    "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing", "nowhere",
    "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent",
    "oughtn't", "shan't", "shouldn't", "uh-uh", "wasn't", "weren't",
    "without", "wont", "wouldnt", "won't", "wouldn't", "rarely", "seldom", "despite",
];

static LEXICON: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| WORD_VALENCES.iter().copied().collect());

static BOOSTER_MAP: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| BOOSTERS.iter().copied().collect());

static NEGATION_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| NEGATIONS.iter().copied().collect());

/// Valence of a lowercase word, if it carries sentiment.
pub fn valence(word: &str) -> Option<f64> {
    LEXICON.get(word).copied()
}

/// Intensity shift of a lowercase booster or dampener word.
pub fn booster(word: &str) -> Option<f64> {
    BOOSTER_MAP.get(word).copied()
}

/// Whether a lowercase word negates what follows.
pub fn is_negation(word: &str) -> bool {
    NEGATION_SET.contains(word) || word.ends_with("n't")
}
