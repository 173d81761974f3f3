//! Query AST
//!
//! Dialect-independent query plan produced by the parser and consumed by the
//! generator.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of query the question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Select,
    Count,
    Sum,
    Avg,
    Max,
    Min,
    Schema,
    Unknown,
}

impl Intent {
    /// All intents in classification order
    pub const ALL: [Intent; 8] = [
        Intent::Select,
        Intent::Count,
        Intent::Sum,
        Intent::Avg,
        Intent::Max,
        Intent::Min,
        Intent::Schema,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Select => "SELECT",
            Intent::Count => "COUNT",
            Intent::Sum => "SUM",
            Intent::Avg => "AVG",
            Intent::Max => "MAX",
            Intent::Min => "MIN",
            Intent::Schema => "SCHEMA",
            Intent::Unknown => "UNKNOWN",
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Intent::Count | Intent::Sum | Intent::Avg | Intent::Max | Intent::Min
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "IN")]
    In,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Ne => "!=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// How a condition chains onto the previous one.
///
/// Extraction always produces `And` and generation always joins with AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainOperator {
    #[default]
    And,
    Or,
}

/// Scalar value of a filter predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl ConditionValue {
    /// Type a raw token: numbers and booleans are recognised, everything
    /// else stays a string.
    pub fn from_token(token: &str) -> Self {
        match token.to_lowercase().as_str() {
            "true" => return ConditionValue::Bool(true),
            "false" => return ConditionValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = token.parse::<i64>() {
            return ConditionValue::Number(n.into());
        }
        if let Ok(f) = token.parse::<f64>() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return ConditionValue::Number(n);
            }
        }
        ConditionValue::String(token.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConditionValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::String(value.to_string())
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        ConditionValue::Number(value.into())
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        ConditionValue::Bool(value)
    }
}

/// WHERE predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: ConditionValue,
    #[serde(default)]
    pub chain: ChainOperator,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, value: ConditionValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
            chain: ChainOperator::And,
        }
    }

    pub fn equals(column: impl Into<String>, value: ConditionValue) -> Self {
        Self::new(column, Operator::Eq, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
        }
    }
}

/// One join edge of the plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinNode {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
    pub join_type: JoinType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Typed query plan
///
/// An empty `select_columns` means every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAst {
    pub intent: Intent,
    pub target_table: Option<String>,
    pub select_columns: Vec<String>,
    pub conditions: Vec<Condition>,
    pub aggregate_column: Option<String>,
    pub joins: Vec<JoinNode>,
    pub limit: Option<u64>,
    pub order_by_column: Option<String>,
    pub order_direction: Option<OrderDirection>,
    pub database_name: Option<String>,
}

impl QueryAst {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            target_table: None,
            select_columns: Vec::new(),
            conditions: Vec::new(),
            aggregate_column: None,
            joins: Vec::new(),
            limit: None,
            order_by_column: None,
            order_direction: None,
            database_name: None,
        }
    }

    pub fn for_table(intent: Intent, table: impl Into<String>) -> Self {
        let mut ast = Self::new(intent);
        ast.target_table = Some(table.into());
        ast
    }

    pub fn selects_all(&self) -> bool {
        self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*")
    }

    /// Database name, if one is set and non-empty
    pub fn database(&self) -> Option<&str> {
        self.database_name.as_deref().filter(|db| !db.is_empty())
    }

    /// Check that every join hangs off the target table or a table joined
    /// before it.
    pub fn joins_connected(&self) -> bool {
        if self.joins.is_empty() {
            return true;
        }
        let Some(target) = &self.target_table else {
            return false;
        };
        let mut reachable: HashSet<String> = HashSet::new();
        reachable.insert(target.to_lowercase());
        for join in &self.joins {
            if !reachable.contains(&join.left_table.to_lowercase()) {
                return false;
            }
            reachable.insert(join.right_table.to_lowercase());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_typing() {
        assert_eq!(ConditionValue::from_token("cs"), ConditionValue::from("cs"));
        assert_eq!(ConditionValue::from_token("20"), ConditionValue::from(20i64));
        assert_eq!(ConditionValue::from_token("TRUE"), ConditionValue::Bool(true));
        match ConditionValue::from_token("3.5") {
            ConditionValue::Number(n) => assert_eq!(n.as_f64(), Some(3.5)),
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_intent_serde_names() {
        assert_eq!(serde_json::to_string(&Intent::Avg).unwrap(), "\"AVG\"");
        let op: Operator = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(op, Operator::Ge);
    }

    #[test]
    fn test_joins_connected() {
        let mut ast = QueryAst::for_table(Intent::Select, "students");
        ast.joins.push(JoinNode {
            left_table: "students".to_string(),
            left_column: "id".to_string(),
            right_table: "enrollments".to_string(),
            right_column: "student_id".to_string(),
            join_type: JoinType::Inner,
        });
        ast.joins.push(JoinNode {
            left_table: "enrollments".to_string(),
            left_column: "course_id".to_string(),
            right_table: "courses".to_string(),
            right_column: "id".to_string(),
            join_type: JoinType::Inner,
        });
        assert!(ast.joins_connected());

        ast.joins.swap(0, 1);
        assert!(!ast.joins_connected());
    }
}
