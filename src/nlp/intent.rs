//! Intent classification
//!
//! Bag-of-keywords vote over a fixed keyword list per intent. Tokens are
//! expected to be normalized, so plural keywords are listed in their
//! suffix-stripped form as well.

use crate::ast::Intent;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

lazy_static! {
    /// Keyword sets in `Intent::ALL` order; the first strict maximum wins
    static ref INTENT_KEYWORDS: Vec<(Intent, HashSet<&'static str>)> = Intent::ALL
        .iter()
        .filter(|intent| !keywords(**intent).is_empty())
        .map(|intent| (*intent, keywords(*intent).iter().copied().collect()))
        .collect();
}

fn keywords(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Select => &["list", "show", "display", "find"],
        Intent::Count => &["count", "many", "number", "total"],
        Intent::Sum => &["sum", "total"],
        Intent::Avg => &["average", "avg", "mean"],
        Intent::Max => &["max", "highest", "largest", "maximum"],
        Intent::Min => &["min", "lowest", "smallest", "minimum"],
        Intent::Schema => &["tables", "table", "schema", "databases", "database", "structure"],
        Intent::Unknown => &[],
    }
}

/// Confidence reported when no keyword matched
pub const UNKNOWN_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    /// Always within [0, 1]
    pub confidence: f64,
}

impl IntentResult {
    pub fn new(intent: Intent, confidence: f64) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, tokens: &[String]) -> IntentResult {
        let mut best_intent = Intent::Unknown;
        let mut best_score = 0usize;

        for (intent, keywords) in INTENT_KEYWORDS.iter() {
            let score = tokens
                .iter()
                .filter(|t| keywords.contains(t.as_str()))
                .count();
            if score > best_score {
                best_score = score;
                best_intent = *intent;
            }
        }

        if best_score == 0 {
            return IntentResult::new(Intent::Unknown, UNKNOWN_CONFIDENCE);
        }
        IntentResult::new(best_intent, (0.6 + 0.2 * best_score as f64).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(words: &[&str]) -> IntentResult {
        let tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        IntentClassifier::new().classify(&tokens)
    }

    #[test]
    fn test_unknown_has_fixed_confidence() {
        let result = classify(&["hello", "world"]);
        assert_eq!(result.intent, Intent::Unknown);
        assert_eq!(result.confidence, UNKNOWN_CONFIDENCE);

        let result = classify(&[]);
        assert_eq!(result.intent, Intent::Unknown);
    }

    #[test]
    fn test_single_keyword() {
        let result = classify(&["average", "age", "student"]);
        assert_eq!(result.intent, Intent::Avg);
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_capped() {
        let result = classify(&["count", "many", "number", "student"]);
        assert_eq!(result.intent, Intent::Count);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_ties_go_to_earlier_intent() {
        // "total" scores for both COUNT and SUM
        assert_eq!(classify(&["total", "salary"]).intent, Intent::Count);
        // "show" (SELECT) vs "table" (SCHEMA)
        assert_eq!(classify(&["show", "table"]).intent, Intent::Select);
    }

    #[test]
    fn test_keyword_table_follows_intent_order() {
        let order: Vec<Intent> = INTENT_KEYWORDS.iter().map(|(intent, _)| *intent).collect();
        let expected: Vec<Intent> = Intent::ALL
            .iter()
            .copied()
            .filter(|intent| *intent != Intent::Unknown)
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_schema_on_normalized_tokens() {
        assert_eq!(classify(&["list", "all", "table", "database"]).intent, Intent::Schema);
    }

    #[test]
    fn test_confidence_always_in_range() {
        let vocab = ["show", "count", "sum", "avg", "max", "min", "schema", "noise", "total"];
        for i in 0..vocab.len() {
            for j in 0..vocab.len() {
                let result = classify(&[vocab[i], vocab[j], vocab[(i + j) % vocab.len()]]);
                assert!((0.0..=1.0).contains(&result.confidence));
            }
        }
    }
}
