//! Schema Cache
//!
//! Per-database snapshots of table -> columns plus the foreign-key graph,
//! refreshed from a [`SchemaIntrospector`] once they are older than the TTL.
//!
//! A snapshot is immutable and shared as `Arc`; a refresh builds a complete
//! new snapshot and swaps it in, so readers never see a half-built one.
//! Refreshes are serialized. While one is running, readers holding a stale
//! snapshot keep using it instead of waiting.

use crate::config::EngineConfig;
use crate::schema::fallback::fallback_snapshot;
use crate::schema::graph::SchemaGraph;
use crate::schema::introspect::SchemaIntrospector;
use crate::schema::TableColumns;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};
use tracing::{debug, info, warn};

const SYSTEM_DATABASES: &[&str] = &["information_schema", "mysql", "performance_schema", "sys"];

/// Source of "now" for TTL checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything known about one database at one point in time
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    pub database: String,
    pub tables: TableColumns,
    pub graph: Arc<SchemaGraph>,
    pub refreshed_at: DateTime<Utc>,
    /// True for the built-in example schema
    pub is_fallback: bool,
}

impl SchemaSnapshot {
    pub fn empty(database: &str, at: DateTime<Utc>) -> Self {
        Self {
            database: database.to_string(),
            tables: TableColumns::new(),
            graph: Arc::new(SchemaGraph::new()),
            refreshed_at: at,
            is_fallback: false,
        }
    }

    /// Columns of `table`, matched case-insensitively
    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(table))
            .map(|(_, columns)| columns.as_slice())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub database: String,
    pub tables: usize,
    pub relations: usize,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub ttl_secs: i64,
    pub databases: Vec<DatabaseStats>,
}

pub struct SchemaCache {
    introspector: Arc<dyn SchemaIntrospector>,
    clock: Arc<dyn Clock>,
    ttl: RwLock<Duration>,
    default_database: String,
    use_fallback: bool,
    fallback: Arc<SchemaSnapshot>,
    snapshots: RwLock<HashMap<String, Arc<SchemaSnapshot>>>,
    refresh_lock: Mutex<()>,
}

impl SchemaCache {
    pub fn new(introspector: Arc<dyn SchemaIntrospector>, config: &EngineConfig) -> Self {
        Self::with_clock(introspector, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        introspector: Arc<dyn SchemaIntrospector>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        let fallback = Arc::new(fallback_snapshot(clock.now()));
        Self {
            introspector,
            clock,
            ttl: RwLock::new(config.schema_ttl()),
            default_database: config.default_database.clone(),
            use_fallback: config.use_fallback_schema,
            fallback,
            snapshots: RwLock::new(HashMap::new()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Empty or missing names mean the default database
    pub fn resolve_database(&self, database: Option<&str>) -> String {
        match database.map(str::trim) {
            Some(db) if !db.is_empty() => db.to_string(),
            _ => self.default_database.clone(),
        }
    }

    pub fn ttl(&self) -> Duration {
        *self.ttl.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_ttl(&self, ttl: Duration) {
        *self.ttl.write().unwrap_or_else(PoisonError::into_inner) = ttl;
    }

    /// Schema used to answer questions: the discovered snapshot, or the
    /// built-in example when discovery found no tables
    pub fn schema(&self, database: Option<&str>) -> Arc<SchemaSnapshot> {
        let snapshot = self.snapshot(database);
        if snapshot.tables.is_empty() && self.use_fallback {
            debug!(
                "No tables discovered for {}, using fallback schema",
                snapshot.database
            );
            return self.fallback.clone();
        }
        snapshot
    }

    pub fn graph(&self, database: Option<&str>) -> Arc<SchemaGraph> {
        self.schema(database).graph.clone()
    }

    pub fn table_names(&self, database: Option<&str>) -> Vec<String> {
        self.schema(database).table_names()
    }

    pub fn columns(&self, database: Option<&str>, table: &str) -> Vec<String> {
        self.schema(database)
            .columns(table)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Discovered snapshot for `database`, refreshing it when missing or
    /// older than the TTL. Never fails: discovery errors are logged and the
    /// previous (possibly empty) snapshot is kept.
    pub fn snapshot(&self, database: Option<&str>) -> Arc<SchemaSnapshot> {
        let db = self.resolve_database(database);
        let current = self.cached(&db);
        if let Some(snapshot) = &current {
            if self.is_fresh(snapshot) {
                return snapshot.clone();
            }
        }

        let _guard = match &current {
            Some(stale) => match self.refresh_lock.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::WouldBlock) => {
                    debug!("Refresh in progress, serving stale schema for {}", db);
                    return stale.clone();
                }
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            },
            None => self
                .refresh_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        };

        // Someone else may have refreshed while we waited for the lock
        let previous = self.cached(&db);
        if let Some(snapshot) = &previous {
            if self.is_fresh(snapshot) {
                return snapshot.clone();
            }
        }

        let snapshot = Arc::new(self.build_snapshot(&db, previous.as_deref()));
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(db, snapshot.clone());
        snapshot
    }

    /// Force the next request for `database` to rediscover it
    pub fn invalidate(&self, database: Option<&str>) {
        let db = self.resolve_database(database);
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&db);
        info!("Schema cache invalidated for {}", db);
    }

    pub fn clear(&self) {
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!("Schema cache cleared");
    }

    /// User databases on the server; system schemas are left out
    pub fn databases(&self) -> Vec<String> {
        match self.introspector.list_databases() {
            Ok(databases) => {
                let user: Vec<String> = databases
                    .into_iter()
                    .filter(|db| !SYSTEM_DATABASES.contains(&db.to_lowercase().as_str()))
                    .collect();
                if user.is_empty() {
                    vec![self.default_database.clone()]
                } else {
                    user
                }
            }
            Err(e) => {
                warn!("Failed to list databases: {}", e);
                vec![self.default_database.clone()]
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
        let mut databases: Vec<DatabaseStats> = snapshots
            .values()
            .map(|s| DatabaseStats {
                database: s.database.clone(),
                tables: s.tables.len(),
                relations: s.graph.relation_count(),
                refreshed_at: s.refreshed_at,
            })
            .collect();
        databases.sort_by(|a, b| a.database.cmp(&b.database));
        CacheStats {
            ttl_secs: self.ttl().num_seconds(),
            databases,
        }
    }

    fn cached(&self, db: &str) -> Option<Arc<SchemaSnapshot>> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(db)
            .cloned()
    }

    fn is_fresh(&self, snapshot: &SchemaSnapshot) -> bool {
        self.clock.now() - snapshot.refreshed_at <= self.ttl()
    }

    fn build_snapshot(&self, db: &str, previous: Option<&SchemaSnapshot>) -> SchemaSnapshot {
        let now = self.clock.now();

        let tables = match self.introspector.discover(db) {
            Ok(tables) => tables,
            Err(e) => {
                warn!("Schema discovery failed for {}: {}; keeping previous schema", db, e);
                return match previous {
                    Some(previous) => SchemaSnapshot {
                        refreshed_at: now,
                        ..previous.clone()
                    },
                    None => SchemaSnapshot::empty(db, now),
                };
            }
        };

        let graph = match self.introspector.discover_foreign_keys(db) {
            Ok(relations) => Arc::new(SchemaGraph::from_relations(relations)),
            Err(e) => {
                warn!("Foreign key discovery failed for {}: {}; keeping previous graph", db, e);
                previous
                    .map(|p| p.graph.clone())
                    .unwrap_or_else(|| Arc::new(SchemaGraph::new()))
            }
        };

        if tables.is_empty() {
            warn!("No tables found in database: {}", db);
        }
        info!(
            "Refreshed schema for {}: {} tables, {} foreign keys",
            db,
            tables.len(),
            graph.relation_count()
        );

        SchemaSnapshot {
            database: db.to_string(),
            tables,
            graph,
            refreshed_at: now,
            is_fallback: false,
        }
    }
}
