//! Deterministic lexicon sentiment scoring (VADER-style).
//!
//! Every token is looked up in a valence lexicon; valences are shifted by
//! preceding boosters, flipped by negations within three tokens, amplified
//! by ALL-CAPS emphasis in mixed-case text, reweighted around a contrastive
//! "but", and finally nudged by `!`/`?` emphasis. The sum is normalised to
//! `[-1, 1]` with `s / sqrt(s² + 15)`.

use pulse_core::{BaselineSentiment, SentimentLabel};

use crate::bm25::round4;
use crate::lexicon::{self, CAPS_INCR, NEGATION_SCALAR};

/// Normalisation constant approximating the maximum expected raw score.
const ALPHA: f64 = 15.0;

/// Emphasis per exclamation mark, counted up to four.
const EXCLAIM_INCR: f64 = 0.292;
const MAX_EXCLAIMS: usize = 4;

/// Emphasis per question mark when two or three are present.
const QUESTION_INCR: f64 = 0.18;

/// Emphasis cap for four or more question marks.
const QUESTION_MAX: f64 = 0.96;

/// Preceding-token distance weights for booster words (1, 2, 3 back).
const BOOSTER_DECAY: [f64; 3] = [1.0, 0.95, 0.9];

/// Score `text`, returning rounded proportions and compound score.
///
/// Text without any scorable token is neutral with `neu == 1.0`.
pub fn analyze(text: &str) -> BaselineSentiment {
    let tokens = prepare_tokens(text);
    if tokens.is_empty() {
        return BaselineSentiment::neutral();
    }
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let cap_diff = has_cap_differential(&tokens);

    let mut valences = Vec::with_capacity(tokens.len());
    for i in 0..tokens.len() {
        let word = lowered[i].as_str();
        let kind_of = word == "kind" && lowered.get(i + 1).is_some_and(|w| w == "of");
        if lexicon::booster(word).is_some() || kind_of {
            valences.push(0.0);
            continue;
        }
        valences.push(token_valence(&tokens, &lowered, i, cap_diff));
    }

    apply_but_contrast(&lowered, &mut valences);
    combine(&valences, text)
}

/// Split on whitespace, trimming surrounding punctuation from words longer
/// than two characters and dropping single-character tokens.
fn prepare_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            let stripped = raw.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.chars().count() <= 2 {
                raw
            } else {
                stripped
            }
        })
        .filter(|t| t.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

/// True when some, but not all, tokens are shouted.
fn has_cap_differential(tokens: &[String]) -> bool {
    let shouted = tokens.iter().filter(|t| is_all_caps(t)).count();
    shouted > 0 && shouted < tokens.len()
}

fn token_valence(tokens: &[String], lowered: &[String], i: usize, cap_diff: bool) -> f64 {
    let Some(mut valence) = lexicon::valence(&lowered[i]) else {
        return 0.0;
    };

    if cap_diff && is_all_caps(&tokens[i]) {
        if valence > 0.0 {
            valence += CAPS_INCR;
        } else {
            valence -= CAPS_INCR;
        }
    }

    for (distance, decay) in BOOSTER_DECAY.iter().enumerate() {
        if i <= distance {
            break;
        }
        let prev = i - distance - 1;
        if lexicon::valence(&lowered[prev]).is_some() {
            continue;
        }
        valence += booster_shift(&tokens[prev], &lowered[prev], valence, cap_diff) * decay;
        if lexicon::is_negation(&lowered[prev]) {
            valence *= NEGATION_SCALAR;
        }
    }

    valence
}

/// Shift contributed by a booster word preceding a sentiment word.
fn booster_shift(token: &str, lowered: &str, valence: f64, cap_diff: bool) -> f64 {
    let Some(mut scalar) = lexicon::booster(lowered) else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if cap_diff && is_all_caps(token) {
        if valence > 0.0 {
            scalar += CAPS_INCR;
        } else {
            scalar -= CAPS_INCR;
        }
    }
    scalar
}

/// Halve sentiment before the first "but" and boost sentiment after it.
fn apply_but_contrast(lowered: &[String], valences: &mut [f64]) {
    let Some(pivot) = lowered.iter().position(|w| w == "but") else {
        return;
    };
    for (idx, v) in valences.iter_mut().enumerate() {
        if idx < pivot {
            *v *= 0.5;
        } else if idx > pivot {
            *v *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclaims = text.matches('!').count().min(MAX_EXCLAIMS) as f64 * EXCLAIM_INCR;
    let questions = text.matches('?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCR,
        _ => QUESTION_MAX,
    };
    exclaims + question_amp
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

/// Compound rounded for storage, with the label read from the stored value.
fn rounded_compound(raw: f64) -> (f64, SentimentLabel) {
    let compound = round4(raw);
    (compound, SentimentLabel::from_compound(compound))
}

fn combine(valences: &[f64], text: &str) -> BaselineSentiment {
    let emphasis = punctuation_emphasis(text);

    let mut sum: f64 = valences.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }
    let compound = normalize(sum);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for &v in valences {
        if v > 0.0 {
            pos_sum += v + 1.0;
        } else if v < 0.0 {
            neg_sum += v - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    if total == 0.0 {
        return BaselineSentiment::neutral();
    }

    let (compound, label) = rounded_compound(compound);
    BaselineSentiment {
        label,
        compound,
        pos: round4((pos_sum / total).abs()),
        neu: round4((neu_count / total).abs()),
        neg: round4((neg_sum / total).abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_neutral() {
        let s = analyze("");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.compound, 0.0);
        assert_eq!(s.neu, 1.0);
    }

    #[test]
    fn test_plain_text_is_neutral() {
        let s = analyze("the app opened on my phone");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.compound, 0.0);
        assert_eq!(s.neu, 1.0);
    }

    #[test]
    fn test_positive_text() {
        let s = analyze("I love this game");
        assert_eq!(s.label, SentimentLabel::Positive);
        assert_eq!(s.compound, 0.6369);
    }

    #[test]
    fn test_label_follows_stored_compound() {
        assert_eq!(rounded_compound(0.04996), (0.05, SentimentLabel::Positive));
        assert_eq!(rounded_compound(-0.04996), (-0.05, SentimentLabel::Negative));
        assert_eq!(rounded_compound(0.04994), (0.0499, SentimentLabel::Neutral));
        assert_eq!(rounded_compound(0.0), (0.0, SentimentLabel::Neutral));
    }

    #[test]
    fn test_negation_flips_polarity() {
        assert_eq!(analyze("good").label, SentimentLabel::Positive);
        assert_eq!(analyze("not good").label, SentimentLabel::Negative);
    }

    #[test]
    fn test_booster_intensifies() {
        assert!(analyze("very good").compound > analyze("good").compound);
        assert!(analyze("slightly good").compound < analyze("good").compound);
    }

    #[test]
    fn test_caps_emphasis() {
        assert!(analyze("GOOD game").compound > analyze("good game").compound);
        // All tokens shouted carries no differential.
        assert_eq!(analyze("GOOD GAME").compound, analyze("good game").compound);
    }

    #[test]
    fn test_exclamation_emphasis() {
        assert!(analyze("good!!!").compound > analyze("good").compound);
    }

    #[test]
    fn test_but_contrast_weights_second_clause() {
        let s = analyze("the puzzles are good but the ads are terrible");
        assert_eq!(s.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_proportions_sum_to_one() {
        let s = analyze("great puzzles, awful ads, decent levels");
        let total = s.pos + s.neu + s.neg;
        assert!((total - 1.0).abs() < 1e-3, "total was {}", total);
    }

    #[test]
    fn test_deterministic() {
        let text = "Matiks crashes EVERY time I open it!!";
        assert_eq!(analyze(text), analyze(text));
    }

    #[test]
    fn test_compound_bounded() {
        let s = analyze("love love love love love love love love best best best!!!!");
        assert!(s.compound <= 1.0 && s.compound > 0.9);
    }
}
