//! Entity recognition
//!
//! Resolves question tokens to a target table and the columns to project,
//! tolerating plurals, synonyms and small typos.

use crate::fuzzy_matcher::FuzzyMatcher;
use crate::nlp::synonyms::SynonymTable;
use crate::schema::TableColumns;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref CONNECTORS: HashSet<&'static str> = ["and", "or", ","].into_iter().collect();
    static ref IS_OPERATORS: HashSet<&'static str> = ["is", "="].into_iter().collect();
}

/// Wildcard projection returned when no column was recognised
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecognition {
    /// Schema name of the selected table
    pub table: Option<String>,
    /// Recognised columns in discovery order, or `["*"]`
    pub columns: Vec<String>,
    pub confidence: f64,
}

impl EntityRecognition {
    pub fn is_wildcard(&self) -> bool {
        self.columns.iter().all(|c| c == WILDCARD)
    }
}

pub struct EntityRecognizer {
    matcher: FuzzyMatcher,
    synonyms: Arc<SynonymTable>,
}

impl EntityRecognizer {
    pub fn new(matcher: FuzzyMatcher, synonyms: Arc<SynonymTable>) -> Self {
        Self { matcher, synonyms }
    }

    pub fn recognize(&self, tokens: &[String], schema: &TableColumns) -> EntityRecognition {
        let (table, table_score) = match self.best_table(tokens, schema) {
            Some((table, score)) => (Some(table), score),
            None => (None, 0.0),
        };

        let mut columns = Vec::new();
        if let Some(table) = &table {
            let table_columns = schema.get(table).map(Vec::as_slice).unwrap_or(&[]);
            columns = self.projected_columns(tokens, table_columns, schema);
        }

        let mut confidence = table_score;
        if !columns.is_empty() {
            confidence = (confidence + 0.1 * columns.len() as f64).min(1.0);
        }

        debug!(
            "Entity recognition: table={:?} columns={:?} confidence={:.2}",
            table, columns, confidence
        );

        EntityRecognition {
            table,
            columns: if columns.is_empty() {
                vec![WILDCARD.to_string()]
            } else {
                columns
            },
            confidence,
        }
    }

    /// Highest-scoring table over all tokens. Strictly greater scores win,
    /// so ties keep the earlier token and, per token, the earlier table in
    /// the schema's sorted order.
    fn best_table(&self, tokens: &[String], schema: &TableColumns) -> Option<(String, f64)> {
        let mut best: Option<(&String, f64)> = None;
        let mut best_score = 0.0;

        for token in tokens {
            for table in schema.keys() {
                let score = self.matcher.table_score(token, table, &self.synonyms);
                if score > best_score && score > self.matcher.config.table_threshold {
                    best_score = score;
                    best = Some((table, score));
                }
            }
        }

        best.map(|(table, score)| (table.clone(), score))
    }

    fn projected_columns(
        &self,
        tokens: &[String],
        table_columns: &[String],
        schema: &TableColumns,
    ) -> Vec<String> {
        let mut recognized: Vec<String> = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            for column in table_columns {
                if recognized.contains(column) {
                    continue;
                }
                let score = self.matcher.column_score(token, column, &self.synonyms);
                if score > self.matcher.config.column_threshold
                    && !is_filter_context(tokens, i, table_columns, schema)
                {
                    recognized.push(column.clone());
                }
            }
        }

        recognized
    }
}

/// Whether the token at `index` looks like the column of a filter
/// ("department cs") rather than a projection target.
///
/// It does when the next token is a plausible value: not a connector, not a
/// column of the table, not a table name, and not "is"/"=".
fn is_filter_context(
    tokens: &[String],
    index: usize,
    table_columns: &[String],
    schema: &TableColumns,
) -> bool {
    let Some(next) = tokens.get(index + 1) else {
        return false;
    };
    let next = next.to_lowercase();

    if CONNECTORS.contains(next.as_str()) || IS_OPERATORS.contains(next.as_str()) {
        return false;
    }
    if table_columns.iter().any(|c| c.eq_ignore_ascii_case(&next)) {
        return false;
    }
    if schema.keys().any(|t| t.eq_ignore_ascii_case(&next)) {
        return false;
    }
    true
}
