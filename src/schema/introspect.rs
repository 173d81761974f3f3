//! Schema introspection collaborator
//!
//! The engine never talks to a database itself: table/column listings and
//! foreign keys come from an implementation of [`SchemaIntrospector`].

use crate::error::{NlqError, Result};
use crate::schema::graph::ForeignKeyRelation;
use crate::schema::TableColumns;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub trait SchemaIntrospector: Send + Sync {
    /// Full table -> ordered columns listing for `database`
    fn discover(&self, database: &str) -> Result<TableColumns>;

    /// Every foreign key declared in `database`
    fn discover_foreign_keys(&self, database: &str) -> Result<Vec<ForeignKeyRelation>>;

    /// Databases visible on the server
    fn list_databases(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// One database in a [`SchemaDocument`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: TableColumns,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRelation>,
}

/// JSON description of one or more databases:
///
/// ```json
/// {"databases": {"engdb": {"tables": {"students": ["id", "name"]},
///                          "foreign_keys": []}}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub databases: BTreeMap<String, DatabaseSchema>,
}

/// Introspector serving a fixed, in-memory schema
#[derive(Debug, Clone, Default)]
pub struct StaticIntrospector {
    document: SchemaDocument,
}

impl StaticIntrospector {
    pub fn new(document: SchemaDocument) -> Self {
        Self { document }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let document: SchemaDocument = serde_json::from_str(&content)?;
        Ok(Self::new(document))
    }

    /// Add or replace one database
    pub fn with_database(
        mut self,
        name: &str,
        tables: TableColumns,
        foreign_keys: Vec<ForeignKeyRelation>,
    ) -> Self {
        self.document
            .databases
            .insert(name.to_string(), DatabaseSchema { tables, foreign_keys });
        self
    }

    fn database(&self, name: &str) -> Result<&DatabaseSchema> {
        self.document
            .databases
            .get(name)
            .ok_or_else(|| NlqError::Introspection(format!("Unknown database: {}", name)))
    }
}

impl SchemaIntrospector for StaticIntrospector {
    fn discover(&self, database: &str) -> Result<TableColumns> {
        Ok(self.database(database)?.tables.clone())
    }

    fn discover_foreign_keys(&self, database: &str) -> Result<Vec<ForeignKeyRelation>> {
        Ok(self.database(database)?.foreign_keys.clone())
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.document.databases.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_json() {
        let json = r#"{
            "databases": {
                "engdb": {
                    "tables": {"students": ["id", "name"], "enrollments": ["student_id"]},
                    "foreign_keys": [{"from_table": "enrollments", "from_column": "student_id",
                                      "to_table": "students", "to_column": "id"}]
                },
                "empty": {"tables": {}}
            }
        }"#;
        let document: SchemaDocument = serde_json::from_str(json).unwrap();
        let introspector = StaticIntrospector::new(document);

        let tables = introspector.discover("engdb").unwrap();
        assert_eq!(tables["students"], vec!["id", "name"]);
        assert_eq!(introspector.discover_foreign_keys("engdb").unwrap().len(), 1);
        assert!(introspector.discover_foreign_keys("empty").unwrap().is_empty());
        assert_eq!(introspector.list_databases().unwrap(), vec!["empty", "engdb"]);
    }

    #[test]
    fn test_unknown_database_is_error() {
        let introspector = StaticIntrospector::default();
        assert!(matches!(
            introspector.discover("nope"),
            Err(NlqError::Introspection(_))
        ));
    }
}
