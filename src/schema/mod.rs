//! Schema knowledge: discovered table/column listings, the foreign-key
//! graph built from them, and the TTL cache that owns both per database.

pub mod cache;
pub mod fallback;
pub mod graph;
pub mod introspect;

use std::collections::BTreeMap;

/// Table name -> ordered column names. Sorted by table so every scan over
/// the schema visits tables in the same order.
pub type TableColumns = BTreeMap<String, Vec<String>>;

pub use cache::{CacheStats, Clock, SchemaCache, SchemaSnapshot, SystemClock};
pub use graph::{ForeignKeyRelation, JoinPath, SchemaGraph};
pub use introspect::{DatabaseSchema, SchemaDocument, SchemaIntrospector, StaticIntrospector};
