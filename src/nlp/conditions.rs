//! WHERE-condition extraction
//!
//! Pairs a token naming a column of the target table with a neighbouring
//! value token. Only exact (case-insensitive) column names are considered
//! here, and every inferred predicate uses `=`.

use crate::ast::{Condition, ConditionValue};
use crate::schema::TableColumns;
use lazy_static::lazy_static;
use std::collections::HashSet;
use tracing::debug;

lazy_static! {
    static ref OPERATOR_KEYWORDS: HashSet<&'static str> =
        ["is", "equals", "equal", "in", "=", "like"].into_iter().collect();

    /// Words never read as filter values: function words, connectors and the
    /// query verbs/aggregate keywords that surround column names
    static ref VALUE_STOP_WORDS: HashSet<&'static str> = [
        "how", "what", "which", "who", "where", "when", "is", "are", "was", "were",
        "the", "a", "an", "of", "to", "in", "on", "at", "by", "for", "from", "with",
        "and", "or", "me", "all", "there", "their", "its", "them", "any", "each",
        "show", "list", "display", "find", "get", "give", "count", "many", "number",
        "total", "sum", "average", "avg", "mean", "max", "maximum", "highest", "largest",
        "min", "minimum", "lowest", "smallest", "along", "including", "having",
    ]
    .into_iter()
    .collect();
}

pub fn is_operator_keyword(token: &str) -> bool {
    OPERATOR_KEYWORDS.contains(token.to_lowercase().as_str())
}

#[derive(Debug, Clone, Default)]
pub struct ConditionExtractor;

impl ConditionExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract `column = value` predicates for `table`, in token order
    pub fn extract(
        &self,
        tokens: &[String],
        table: Option<&str>,
        schema: &TableColumns,
    ) -> Vec<Condition> {
        let Some(table) = table else {
            return Vec::new();
        };
        let Some(columns) = schema.get(table) else {
            return Vec::new();
        };

        let mut conditions = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let Some(column) = columns.iter().find(|c| c.eq_ignore_ascii_case(token)) else {
                continue;
            };
            if let Some(value) = find_value(tokens, i, schema) {
                debug!("Condition: {} = {}", column, value);
                conditions.push(Condition::equals(
                    column.clone(),
                    ConditionValue::from_token(value),
                ));
            }
        }
        conditions
    }
}

/// Value for the column token at `index`: after an operator keyword, else
/// the following token, else the preceding one.
fn find_value<'a>(tokens: &'a [String], index: usize, schema: &TableColumns) -> Option<&'a str> {
    let next = tokens.get(index + 1);

    if let Some(next) = next {
        if is_operator_keyword(next) {
            if let Some(value) = tokens.get(index + 2) {
                return Some(value.as_str());
            }
        } else if is_value_candidate(next, schema) {
            return Some(next.as_str());
        }
    }

    let previous = index.checked_sub(1).and_then(|p| tokens.get(p))?;
    if is_value_candidate(previous, schema) && !is_operator_keyword(previous) {
        return Some(previous.as_str());
    }
    None
}

fn is_value_candidate(token: &str, schema: &TableColumns) -> bool {
    let lowered = token.to_lowercase();
    if VALUE_STOP_WORDS.contains(lowered.as_str()) {
        return false;
    }
    !is_schema_name(&lowered, schema)
}

fn is_schema_name(token: &str, schema: &TableColumns) -> bool {
    schema.iter().any(|(table, columns)| {
        table.eq_ignore_ascii_case(token) || columns.iter().any(|c| c.eq_ignore_ascii_case(token))
    })
}
