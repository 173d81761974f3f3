//! Query Parser
//!
//! Assembles a [`QueryAst`] from question tokens: target table and
//! projection, aggregate column, filters, and the joins needed to reach
//! every other table the question mentions.

use crate::ast::{JoinNode, JoinType, QueryAst};
use crate::fuzzy_matcher::FuzzyMatcher;
use crate::nlp::{ConditionExtractor, EntityRecognizer, IntentResult, JoinDetector};
use crate::schema::{SchemaCache, SchemaGraph};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Words that usually name the measured column of an aggregate question
const NUMERIC_KEYWORDS: [&str; 6] = ["age", "grade", "credit", "price", "salary", "score"];

pub struct QueryParser {
    cache: Arc<SchemaCache>,
    recognizer: EntityRecognizer,
    extractor: ConditionExtractor,
    detector: JoinDetector,
}

impl QueryParser {
    pub fn new(cache: Arc<SchemaCache>, recognizer: EntityRecognizer) -> Self {
        Self {
            cache,
            recognizer,
            extractor: ConditionExtractor::new(),
            detector: JoinDetector::new(),
        }
    }

    /// Build the plan for `tokens` against the schema of `database`.
    ///
    /// ORDER BY and LIMIT are never inferred from text; callers set them on
    /// the returned plan if they need them.
    pub fn parse(
        &self,
        tokens: &[String],
        intent: &IntentResult,
        database: Option<&str>,
    ) -> QueryAst {
        let snapshot = self.cache.schema(database);
        let schema = &snapshot.tables;

        let mut ast = QueryAst::new(intent.intent);
        ast.database_name = database
            .map(str::trim)
            .filter(|db| !db.is_empty())
            .map(String::from);

        let entities = self.recognizer.recognize(tokens, schema);
        ast.target_table = entities.table.clone();

        let conditions = self
            .extractor
            .extract(tokens, ast.target_table.as_deref(), schema);

        // A column used as a filter is not also projected
        if !entities.is_wildcard() {
            ast.select_columns = entities
                .columns
                .into_iter()
                .filter(|c| !conditions.iter().any(|cond| cond.column.eq_ignore_ascii_case(c)))
                .collect();
        }
        ast.conditions = conditions;

        if intent.intent.is_aggregate() {
            let table_columns = ast
                .target_table
                .as_deref()
                .and_then(|t| snapshot.columns(t))
                .unwrap_or(&[]);
            ast.aggregate_column = aggregate_column(tokens, table_columns, &ast.select_columns);
        }

        let detection = self.detector.detect(tokens, schema);
        if detection.detected_tables.len() >= 2 {
            let base = ast
                .target_table
                .clone()
                .or_else(|| detection.detected_tables.first().cloned());
            if let Some(base) = base {
                ast.joins = synthesize_joins(&base, &detection.detected_tables, &snapshot.graph);
            }
        }

        debug!(
            "Parsed: intent={} table={:?} columns={:?} conditions={} joins={}",
            ast.intent,
            ast.target_table,
            ast.select_columns,
            ast.conditions.len(),
            ast.joins.len()
        );

        ast
    }
}

/// Column an aggregate intent works on: the table's own column for a
/// numeric keyword in the question, else the first projected column that
/// is not the id.
fn aggregate_column(tokens: &[String], table_columns: &[String], projected: &[String]) -> Option<String> {
    let keyword_column = tokens
        .iter()
        .filter_map(|token| {
            NUMERIC_KEYWORDS
                .iter()
                .find(|keyword| FuzzyMatcher::is_similar(token, keyword))
        })
        .find_map(|keyword| {
            table_columns
                .iter()
                .find(|c| FuzzyMatcher::is_similar(keyword, c))
                .cloned()
        });
    if keyword_column.is_some() {
        return keyword_column;
    }

    projected
        .iter()
        .find(|c| c.as_str() != "*" && !c.eq_ignore_ascii_case("id"))
        .cloned()
}

/// One INNER join per relation on the shortest path from `base` to each
/// other table, skipping tables that are already joined.
fn synthesize_joins(base: &str, tables: &[String], graph: &SchemaGraph) -> Vec<JoinNode> {
    let mut joined: HashSet<String> = HashSet::new();
    joined.insert(base.to_lowercase());
    let mut joins = Vec::new();

    for table in tables {
        if joined.contains(&table.to_lowercase()) {
            continue;
        }
        let Some(path) = graph.find_path(base, table) else {
            warn!("No join path from {} to {}", base, table);
            continue;
        };
        for relation in path.iter() {
            if joined.insert(relation.to_table.to_lowercase()) {
                joins.push(JoinNode {
                    left_table: relation.from_table.clone(),
                    left_column: relation.from_column.clone(),
                    right_table: relation.to_table.clone(),
                    right_column: relation.to_column.clone(),
                    join_type: JoinType::Inner,
                });
            }
        }
    }

    joins
}
