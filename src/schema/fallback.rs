use crate::schema::cache::SchemaSnapshot;
use crate::schema::graph::{ForeignKeyRelation, SchemaGraph};
use crate::schema::TableColumns;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const FALLBACK_DATABASE: &str = "fallback";

/// The students / courses / enrollments example schema
pub fn fallback_tables() -> TableColumns {
    [
        ("students", &["id", "name", "age", "department"][..]),
        ("courses", &["id", "name", "credits"][..]),
        ("enrollments", &["student_id", "course_id", "grade"][..]),
    ]
    .into_iter()
    .map(|(table, columns)| {
        (
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        )
    })
    .collect()
}

pub fn fallback_relations() -> Vec<ForeignKeyRelation> {
    vec![
        ForeignKeyRelation::new("enrollments", "student_id", "students", "id"),
        ForeignKeyRelation::new("enrollments", "course_id", "courses", "id"),
    ]
}

pub fn fallback_snapshot(at: DateTime<Utc>) -> SchemaSnapshot {
    SchemaSnapshot {
        database: FALLBACK_DATABASE.to_string(),
        tables: fallback_tables(),
        graph: Arc::new(SchemaGraph::from_relations(fallback_relations())),
        refreshed_at: at,
        is_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_joins_students_to_courses() {
        let snapshot = fallback_snapshot(Utc::now());
        assert!(snapshot.is_fallback);
        assert_eq!(snapshot.tables.len(), 3);
        let path = snapshot.graph.find_path("students", "courses").unwrap();
        assert_eq!(path.len(), 2);
    }
}
