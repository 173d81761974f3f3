//! Query Generator
//!
//! Renders a [`QueryAst`] as SQL or as a document-store shell query.

use crate::ast::{Condition, ConditionValue, Intent, Operator, OrderDirection, QueryAst};
use crate::engine::planner::Dialect;
use crate::error::{NlqError, Result};
use itertools::Itertools;

#[derive(Debug, Clone, Default)]
pub struct QueryGenerator;

impl QueryGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, ast: &QueryAst, dialect: Dialect) -> Result<String> {
        match dialect {
            Dialect::Sql => self.to_sql(ast),
            Dialect::Document => self.to_document_query(ast),
        }
    }

    pub fn to_sql(&self, ast: &QueryAst) -> Result<String> {
        let db = ast.database();
        let Some(table) = target_table(ast)? else {
            return Ok(match db {
                Some(db) => format!("SHOW TABLES FROM {}", db),
                None => "SHOW TABLES".to_string(),
            });
        };

        if ast.intent == Intent::Schema {
            return Ok(format!("SHOW COLUMNS FROM {}", qualify(db, table)));
        }

        let mut sql = format!("SELECT {} FROM {}", select_clause(ast), qualify(db, table));

        for join in &ast.joins {
            sql.push_str(&format!(
                " {} {} ON {}.{} = {}.{}",
                join.join_type.as_sql(),
                qualify(db, &join.right_table),
                join.left_table,
                join.left_column,
                join.right_table,
                join.right_column
            ));
        }

        if !ast.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&ast.conditions.iter().map(sql_condition).join(" AND "));
        }

        if let Some(column) = &ast.order_by_column {
            sql.push_str(&format!(" ORDER BY {}", column));
            if let Some(direction) = ast.order_direction {
                sql.push_str(&format!(" {}", direction.as_sql()));
            }
        }

        if let Some(limit) = ast.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(sql)
    }

    /// Shell-style document query, e.g. `db.students.find({"age": {$gt: 20}})`
    pub fn to_document_query(&self, ast: &QueryAst) -> Result<String> {
        let Some(table) = target_table(ast)? else {
            return Ok("db.getCollectionNames()".to_string());
        };

        let filter = document_filter(&ast.conditions);

        let query = match ast.intent {
            Intent::Schema => format!("db.{}.findOne()", table),
            Intent::Count => match ast.limit {
                Some(limit) => format!("db.{}.countDocuments({}, {{limit: {}}})", table, filter, limit),
                None => format!("db.{}.countDocuments({})", table, filter),
            },
            Intent::Sum | Intent::Avg | Intent::Max | Intent::Min => {
                let mut stages = Vec::new();
                if !ast.conditions.is_empty() {
                    stages.push(format!("{{$match: {}}}", filter));
                }
                let operand = match &ast.aggregate_column {
                    Some(column) => json_string(&format!("${}", column)),
                    None => "1".to_string(),
                };
                stages.push(format!(
                    "{{$group: {{_id: null, result: {{${}: {}}}}}}}",
                    ast.intent.as_str().to_lowercase(),
                    operand
                ));
                let mut query = format!("db.{}.aggregate([{}])", table, stages.join(", "));
                if let Some(limit) = ast.limit {
                    query.push_str(&format!(".limit({})", limit));
                }
                query
            }
            Intent::Select | Intent::Unknown => {
                let mut query = format!("db.{}.find({})", table, filter);
                if !ast.selects_all() {
                    let fields = ast
                        .select_columns
                        .iter()
                        .map(|c| format!("{}: 1", json_string(c)))
                        .join(", ");
                    query.push_str(&format!(".projection({{{}}})", fields));
                }
                if let Some(column) = &ast.order_by_column {
                    let direction = match ast.order_direction {
                        Some(OrderDirection::Desc) => -1,
                        _ => 1,
                    };
                    query.push_str(&format!(".sort({{{}: {}}})", json_string(column), direction));
                }
                if let Some(limit) = ast.limit {
                    query.push_str(&format!(".limit({})", limit));
                }
                query
            }
        };

        Ok(query)
    }
}

/// Target table of a plan that can be rendered. `None` only for a
/// table-less schema question.
fn target_table(ast: &QueryAst) -> Result<Option<&str>> {
    let table = match (ast.target_table.as_deref(), ast.intent) {
        (Some(table), _) => table,
        (None, Intent::Schema) => return Ok(None),
        (None, _) => {
            return Err(NlqError::InvalidArgument(
                "query has no target table".to_string(),
            ))
        }
    };
    if !ast.joins_connected() {
        return Err(NlqError::InvalidArgument(format!(
            "joins are not connected to table {}",
            table
        )));
    }
    Ok(Some(table))
}

fn qualify(db: Option<&str>, table: &str) -> String {
    match db {
        Some(db) => format!("{}.{}", db, table),
        None => table.to_string(),
    }
}

fn select_clause(ast: &QueryAst) -> String {
    match ast.intent {
        Intent::Count => format!("COUNT({})", ast.aggregate_column.as_deref().unwrap_or("*")),
        Intent::Sum | Intent::Avg | Intent::Max | Intent::Min => format!(
            "{}({})",
            ast.intent.as_str(),
            ast.aggregate_column.as_deref().unwrap_or("id")
        ),
        Intent::Select | Intent::Unknown | Intent::Schema => {
            if ast.selects_all() {
                "*".to_string()
            } else {
                ast.select_columns.join(", ")
            }
        }
    }
}

fn sql_condition(condition: &Condition) -> String {
    let value = sql_value(&condition.value);
    match condition.operator {
        Operator::In => format!("{} IN ({})", condition.column, value),
        operator => format!("{} {} {}", condition.column, operator.as_sql(), value),
    }
}

fn sql_value(value: &ConditionValue) -> String {
    match value {
        ConditionValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        ConditionValue::Number(n) => n.to_string(),
        ConditionValue::Bool(true) => "TRUE".to_string(),
        ConditionValue::Bool(false) => "FALSE".to_string(),
    }
}

fn document_filter(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return "{}".to_string();
    }
    let fields = conditions
        .iter()
        .map(|c| format!("{}: {}", json_string(&c.column), document_predicate(c)))
        .join(", ");
    format!("{{{}}}", fields)
}

fn document_predicate(condition: &Condition) -> String {
    let value = document_value(&condition.value);
    let operator = match condition.operator {
        Operator::Eq => return value,
        Operator::Gt => "$gt",
        Operator::Lt => "$lt",
        Operator::Ge => "$gte",
        Operator::Le => "$lte",
        Operator::Ne => "$ne",
        Operator::Like => "$regex",
        Operator::In => return format!("{{$in: [{}]}}", value),
    };
    format!("{{{}: {}}}", operator, value)
}

fn document_value(value: &ConditionValue) -> String {
    match value {
        ConditionValue::String(s) => json_string(s),
        ConditionValue::Number(n) => n.to_string(),
        ConditionValue::Bool(b) => b.to_string(),
    }
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}
