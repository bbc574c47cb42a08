//! Text normalization shared by intent matching and reply interpretation.
//!
//! Everything here is pure and deterministic: the same input always
//! yields the same tokens in the same order.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at", "be",
        "been", "but", "by", "can", "cant", "could", "did", "do", "does", "dont", "for", "from",
        "get", "gets", "getting", "got", "had", "has", "have", "help", "hi", "hello", "how", "i",
        "im", "in", "is", "isnt", "it", "its", "ive", "just", "me", "my", "no", "not", "of", "on",
        "or", "our", "please", "so", "some", "that", "the", "their", "there", "this", "to", "too",
        "up", "very", "was", "we", "what", "when", "why", "will", "with", "wont", "would", "you",
        "your",
    ]
    .into_iter()
    .collect()
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

/// Lowercases, drops apostrophes and replaces every other
/// non-alphanumeric character with a single space.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Light suffix stripping so that "showers" matches "shower" and
/// "heating" matches "heat".
pub fn stem(word: &str) -> String {
    if word.len() <= 3 || word.chars().all(|c| c.is_ascii_digit()) {
        return word.to_string();
    }
    if let Some(base) = word.strip_suffix("ies") {
        if base.len() >= 2 {
            return format!("{}y", base);
        }
    }
    if let Some(base) = word.strip_suffix("ing") {
        if base.len() >= 3 {
            return base.to_string();
        }
    }
    if let Some(base) = word.strip_suffix("ed") {
        if base.len() >= 3 {
            return base.to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Normalized, stemmed words in order, stop-words included.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text).split_whitespace().map(stem).collect()
}

/// Returns true if `word` carries no topical meaning.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Distinct stemmed content words: no stop-words, no bare numbers.
pub fn salient_tokens(text: &str) -> BTreeSet<String> {
    normalize(text)
        .split_whitespace()
        .filter(|w| !is_stop_word(w))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .map(stem)
        .filter(|w| w.len() > 1)
        .collect()
}

/// Returns true if `phrase` occurs as a contiguous run inside `haystack`.
pub fn contains_phrase(haystack: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() || phrase.len() > haystack.len() {
        return false;
    }
    haystack.windows(phrase.len()).any(|window| window == phrase)
}

/// First number in the text, if any ("it is set to 120" gives 120).
pub fn first_number(text: &str) -> Option<f64> {
    NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
