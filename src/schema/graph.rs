//! Schema Graph
//!
//! Foreign-key relations between tables, stored in both directions so a
//! join can be walked from either side. Shortest join paths are found by
//! breadth-first search and memoized per (source, destination) pair.
//!
//! Table identity is case-insensitive; relations keep the schema's casing.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// Directed foreign-key edge `from_table.from_column -> to_table.to_column`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRelation {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl ForeignKeyRelation {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from_table: self.to_table.clone(),
            from_column: self.to_column.clone(),
            to_table: self.from_table.clone(),
            to_column: self.from_column.clone(),
        }
    }
}

/// Walk from a source table to a destination table. Empty means the source
/// is the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPath {
    pub relations: Vec<ForeignKeyRelation>,
}

impl JoinPath {
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForeignKeyRelation> {
        self.relations.iter()
    }
}

#[derive(Debug, Default)]
pub struct SchemaGraph {
    /// Lowercased table name -> outgoing relations in insertion order
    adjacency: HashMap<String, Vec<ForeignKeyRelation>>,
    /// Lowercased (source, destination) -> search result
    path_cache: Mutex<HashMap<(String, String), Option<JoinPath>>>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_relations<I>(relations: I) -> Self
    where
        I: IntoIterator<Item = ForeignKeyRelation>,
    {
        let mut graph = Self::new();
        for relation in relations {
            graph.add_relation(relation);
        }
        graph
    }

    /// Add a foreign key and its reverse edge
    pub fn add_relationship(
        &mut self,
        from_table: &str,
        from_column: &str,
        to_table: &str,
        to_column: &str,
    ) {
        self.add_relation(ForeignKeyRelation::new(from_table, from_column, to_table, to_column));
    }

    pub fn add_relation(&mut self, relation: ForeignKeyRelation) {
        let reverse = relation.reversed();
        self.adjacency
            .entry(relation.from_table.to_lowercase())
            .or_default()
            .push(relation);
        self.adjacency
            .entry(reverse.from_table.to_lowercase())
            .or_default()
            .push(reverse);
        self.clear_cache();
    }

    pub fn are_directly_related(&self, table_a: &str, table_b: &str) -> bool {
        self.relationships(table_a)
            .iter()
            .any(|r| r.to_table.eq_ignore_ascii_case(table_b))
    }

    /// Every table touching at least one relation, sorted
    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self
            .adjacency
            .values()
            .filter_map(|relations| relations.first())
            .map(|r| r.from_table.clone())
            .collect();
        tables.sort();
        tables
    }

    pub fn relationships(&self, table: &str) -> &[ForeignKeyRelation] {
        self.adjacency
            .get(&table.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn relation_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Shortest join path from `from` to `to`, `None` when unreachable
    pub fn find_path(&self, from: &str, to: &str) -> Option<JoinPath> {
        if from.eq_ignore_ascii_case(to) {
            return Some(JoinPath::default());
        }

        let key = (from.to_lowercase(), to.to_lowercase());
        if let Some(cached) = self.cached(&key) {
            return cached;
        }

        let path = self.breadth_first(&key.0, &key.1);
        debug!(
            "Join path {} -> {}: {:?}",
            from,
            to,
            path.as_ref().map(JoinPath::len)
        );

        if let Ok(mut cache) = self.path_cache.lock() {
            cache.insert(key, path.clone());
        }
        path
    }

    fn cached(&self, key: &(String, String)) -> Option<Option<JoinPath>> {
        self.path_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(key).cloned())
    }

    fn breadth_first(&self, from: &str, to: &str) -> Option<JoinPath> {
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut parent: HashMap<String, &ForeignKeyRelation> = HashMap::new();

        queue.push_back(from.to_string());
        visited.insert(from.to_string());

        while let Some(current) = queue.pop_front() {
            if current == to {
                return Some(reconstruct(from, to, &parent));
            }

            for relation in self.adjacency.get(&current).into_iter().flatten() {
                let next = relation.to_table.to_lowercase();
                if visited.insert(next.clone()) {
                    parent.insert(next.clone(), relation);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Forget memoized paths
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.path_cache.lock() {
            cache.clear();
        }
    }

    pub fn cached_path_count(&self) -> usize {
        self.path_cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

fn reconstruct(from: &str, to: &str, parent: &HashMap<String, &ForeignKeyRelation>) -> JoinPath {
    let mut relations = Vec::new();
    let mut current = to.to_string();
    while current != from {
        let Some(relation) = parent.get(&current) else {
            break;
        };
        relations.push((*relation).clone());
        current = relation.from_table.to_lowercase();
    }
    relations.reverse();
    JoinPath { relations }
}
