//! Edit-distance-tolerant word and phrase matching.
//!
//! The tolerance exists to absorb typos ("exlpore", "recomend") without
//! requiring exact phrasing. Budgets tighten for short words so that "no"
//! never drifts into "now".

use strsim::levenshtein;

/// Words too common to carry meaning in a pattern.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "to", "me", "my", "for", "of", "on", "in", "is", "it", "i", "you", "please",
    "some", "and",
];

/// Edit-distance budget for a target word of the given length.
pub fn edit_budget(len: usize) -> usize {
    match len {
        0..=3 => 0,
        4..=5 => 1,
        _ => 2,
    }
}

/// Lowercased alphanumeric tokens of an utterance.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_matches('\'').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether some token of the utterance is within the target word's budget.
pub fn word_matches(target: &str, tokens: &[String]) -> bool {
    let budget = edit_budget(target.len());
    tokens
        .iter()
        .any(|t| levenshtein(target, t) <= budget)
}

/// Tolerant phrase comparison: every significant word of `phrase` must
/// have some utterance token within its budget. Phrases with no
/// significant words ("hi") fall back to exact token matching.
pub fn phrase_matches(phrase: &str, tokens: &[String]) -> bool {
    let words: Vec<String> = tokenize(phrase);
    let significant: Vec<&String> = words
        .iter()
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .collect();

    if significant.is_empty() {
        return words.iter().all(|w| tokens.iter().any(|t| t == w));
    }

    significant.iter().all(|w| word_matches(w, tokens))
}

/// Count of significant phrase words matched; used to rank competing
/// rules (more specific pattern wins).
pub fn match_weight(phrase: &str, tokens: &[String]) -> usize {
    tokenize(phrase)
        .iter()
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| word_matches(w, tokens))
        .count()
}

/// Deterministic seed derived from an utterance, for phrasing variety
/// that stays stable across identical inputs.
pub fn utterance_seed(utterance: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    utterance.trim().to_lowercase().hash(&mut hasher);
    hasher.finish()
}
