use crate::ast::QueryAst;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sql,
    Document,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sql => f.write_str("sql"),
            Dialect::Document => f.write_str("document"),
        }
    }
}

/// Complexity above which a plan is worth optimizing
const OPTIMIZATION_THRESHOLD: u32 = 5;

/// Chooses how a plan is rendered
///
/// Every plan currently goes to SQL. Routing by content (for example,
/// sending unstructured-data questions to the document store) belongs in
/// `choose_dialect`.
#[derive(Debug, Clone, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn choose_dialect(&self, _ast: &QueryAst) -> Dialect {
        Dialect::Sql
    }

    /// 1 + one per condition + two per join
    pub fn estimate_complexity(&self, ast: &QueryAst) -> u32 {
        1 + ast.conditions.len() as u32 + 2 * ast.joins.len() as u32
    }

    pub fn needs_optimization(&self, ast: &QueryAst) -> bool {
        self.estimate_complexity(ast) > OPTIMIZATION_THRESHOLD
    }
}
