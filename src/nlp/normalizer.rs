use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "how", "what", "is", "are", "the", "a", "an", "of", "to", "in", "on",
    ]
    .into_iter()
    .collect();
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Drop stop-words, keeping order
pub fn remove_stop_words(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !is_stop_word(t))
        .cloned()
        .collect()
}

/// Naive suffix stripping: "ing", else "ed", else "s". A suffix is only
/// removed when something is left of the word.
pub fn lemmatize(word: &str) -> String {
    for suffix in ["ing", "ed", "s"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if !stem.is_empty() {
                return stem.to_string();
            }
            break;
        }
    }
    word.to_string()
}

/// Stop-word removal followed by suffix stripping
pub fn normalize(tokens: &[String]) -> Vec<String> {
    remove_stop_words(tokens)
        .iter()
        .map(|t| lemmatize(t))
        .collect()
}
