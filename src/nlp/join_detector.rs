use crate::fuzzy_matcher::FuzzyMatcher;
use crate::schema::TableColumns;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

lazy_static! {
    static ref JOIN_KEYWORDS: HashSet<&'static str> =
        ["with", "and", "along", "including", "having", "their", "its"]
            .into_iter()
            .collect();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinDetection {
    pub requires_join: bool,
    /// Distinct tables referenced, in sorted order
    pub detected_tables: Vec<String>,
    pub has_join_keyword: bool,
}

/// Finds every table a question touches, by table name or by column name
#[derive(Debug, Clone, Default)]
pub struct JoinDetector;

impl JoinDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, tokens: &[String], schema: &TableColumns) -> JoinDetection {
        let mut tables: BTreeSet<&String> = BTreeSet::new();

        for token in tokens {
            for (table, columns) in schema {
                if FuzzyMatcher::is_similar(token, table)
                    || columns.iter().any(|c| FuzzyMatcher::is_similar(token, c))
                {
                    tables.insert(table);
                }
            }
        }

        let has_join_keyword = tokens
            .iter()
            .any(|t| JOIN_KEYWORDS.contains(t.to_lowercase().as_str()));

        let requires_join = tables.len() > 1 || (has_join_keyword && !tables.is_empty());

        JoinDetection {
            requires_join,
            detected_tables: tables.into_iter().cloned().collect(),
            has_join_keyword,
        }
    }
}
