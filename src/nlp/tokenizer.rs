use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^a-z0-9\s]").expect("valid pattern");
}

/// Lowercase, strip everything but ASCII letters, digits and whitespace,
/// then split on whitespace. Token order is preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("  Show me ALL students!  "),
            vec!["show", "me", "all", "students"]
        );
    }

    #[test]
    fn test_punctuation_is_removed_not_split() {
        assert_eq!(tokenize("students' ages, in C.S."), vec!["students", "ages", "in", "cs"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?!").is_empty());
    }
}
