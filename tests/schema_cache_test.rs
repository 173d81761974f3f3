use chrono::{DateTime, Duration, TimeZone, Utc};
use nlq_engine::error::{NlqError, Result};
use nlq_engine::schema::{
    Clock, ForeignKeyRelation, SchemaCache, SchemaIntrospector, TableColumns,
};
use nlq_engine::EngineConfig;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        })
    }

    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Introspector whose answers and failures can be changed between calls
struct ScriptedIntrospector {
    tables: Mutex<TableColumns>,
    relations: Mutex<Vec<ForeignKeyRelation>>,
    fail_tables: AtomicBool,
    fail_relations: AtomicBool,
    discover_calls: AtomicUsize,
}

impl ScriptedIntrospector {
    fn new(tables: &[(&str, &[&str])]) -> Arc<Self> {
        let introspector = Arc::new(Self {
            tables: Mutex::new(TableColumns::new()),
            relations: Mutex::new(Vec::new()),
            fail_tables: AtomicBool::new(false),
            fail_relations: AtomicBool::new(false),
            discover_calls: AtomicUsize::new(0),
        });
        introspector.set_tables(tables);
        introspector
    }

    fn set_tables(&self, tables: &[(&str, &[&str])]) {
        *self.tables.lock().unwrap() = tables
            .iter()
            .map(|(t, cols)| (t.to_string(), cols.iter().map(|c| c.to_string()).collect()))
            .collect();
    }

    fn calls(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }
}

impl SchemaIntrospector for ScriptedIntrospector {
    fn discover(&self, _database: &str) -> Result<TableColumns> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tables.load(Ordering::SeqCst) {
            return Err(NlqError::Introspection("connection reset".to_string()));
        }
        Ok(self.tables.lock().unwrap().clone())
    }

    fn discover_foreign_keys(&self, _database: &str) -> Result<Vec<ForeignKeyRelation>> {
        if self.fail_relations.load(Ordering::SeqCst) {
            return Err(NlqError::Introspection("permission denied".to_string()));
        }
        Ok(self.relations.lock().unwrap().clone())
    }
}

fn cache_with(introspector: Arc<ScriptedIntrospector>, clock: Arc<ManualClock>) -> SchemaCache {
    SchemaCache::with_clock(introspector, clock, &EngineConfig::default())
}

const SCHOOL: &[(&str, &[&str])] = &[
    ("students", &["id", "name"]),
    ("enrollments", &["student_id", "course_id"]),
    ("courses", &["id", "name"]),
];

#[test]
fn test_snapshot_reused_within_ttl() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    let clock = ManualClock::new();
    let cache = cache_with(introspector.clone(), clock.clone());

    assert_eq!(cache.table_names(None).len(), 3);
    assert_eq!(introspector.calls(), 1);

    clock.advance(Duration::minutes(30));
    cache.schema(None);
    cache.graph(None);
    assert_eq!(introspector.calls(), 1);

    clock.advance(Duration::minutes(31));
    cache.schema(None);
    assert_eq!(introspector.calls(), 2);
}

#[test]
fn test_databases_cached_independently() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    let cache = cache_with(introspector.clone(), ManualClock::new());

    cache.schema(Some("a"));
    cache.schema(Some("b"));
    cache.schema(Some("a"));
    assert_eq!(introspector.calls(), 2);

    let stats = cache.stats();
    assert_eq!(stats.ttl_secs, 3600);
    let names: Vec<&str> = stats.databases.iter().map(|d| d.database.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(stats.databases[0].tables, 3);
}

#[test]
fn test_set_ttl_and_invalidate() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    let clock = ManualClock::new();
    let cache = cache_with(introspector.clone(), clock.clone());

    cache.schema(None);
    cache.set_ttl(Duration::seconds(10));
    assert_eq!(cache.ttl(), Duration::seconds(10));
    clock.advance(Duration::seconds(11));
    cache.schema(None);
    assert_eq!(introspector.calls(), 2);

    cache.invalidate(None);
    cache.schema(None);
    assert_eq!(introspector.calls(), 3);

    cache.clear();
    assert!(cache.stats().databases.is_empty());
    cache.schema(None);
    assert_eq!(introspector.calls(), 4);
}

#[test]
fn test_refresh_replaces_snapshot_wholesale() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    let clock = ManualClock::new();
    let cache = cache_with(introspector.clone(), clock.clone());

    let before = cache.schema(None);
    introspector.set_tables(&[("students", &["id", "email"])]);
    clock.advance(Duration::hours(2));

    let after = cache.schema(None);
    assert_eq!(after.table_names(), vec!["students"]);
    assert_eq!(cache.columns(None, "students"), vec!["id", "email"]);
    // readers holding the old snapshot still see it intact
    assert_eq!(before.tables.len(), 3);
    assert_eq!(before.columns("students").unwrap(), &["id", "name"]);
}

#[test]
fn test_failed_refresh_keeps_previous_snapshot() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    let clock = ManualClock::new();
    let cache = cache_with(introspector.clone(), clock.clone());

    let first = cache.schema(None);
    introspector.fail_tables.store(true, Ordering::SeqCst);
    clock.advance(Duration::hours(2));

    let retained = cache.schema(None);
    assert_eq!(retained.tables, first.tables);
    assert!(retained.refreshed_at > first.refreshed_at);
    assert_eq!(introspector.calls(), 2);

    // the failure is not retried until the TTL passes again
    cache.schema(None);
    assert_eq!(introspector.calls(), 2);
}

#[test]
fn test_cold_failure_uses_fallback() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    introspector.fail_tables.store(true, Ordering::SeqCst);
    let cache = cache_with(introspector, ManualClock::new());

    assert!(cache.snapshot(None).tables.is_empty());
    let schema = cache.schema(None);
    assert!(schema.is_fallback);
    assert!(schema.graph.find_path("students", "courses").is_some());
}

#[test]
fn test_foreign_key_failure_keeps_previous_graph() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    *introspector.relations.lock().unwrap() = vec![
        ForeignKeyRelation::new("enrollments", "student_id", "students", "id"),
        ForeignKeyRelation::new("enrollments", "course_id", "courses", "id"),
    ];
    let clock = ManualClock::new();
    let cache = cache_with(introspector.clone(), clock.clone());
    assert_eq!(cache.graph(None).relation_count(), 2);

    introspector.fail_relations.store(true, Ordering::SeqCst);
    introspector.set_tables(&[("students", &["id"]), ("courses", &["id"])]);
    clock.advance(Duration::hours(2));

    let schema = cache.schema(None);
    assert_eq!(schema.tables.len(), 2);
    assert_eq!(schema.graph.relation_count(), 2);
}

#[test]
fn test_rebuilt_graph_starts_with_empty_path_cache() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    *introspector.relations.lock().unwrap() =
        vec![ForeignKeyRelation::new("enrollments", "student_id", "students", "id")];
    let clock = ManualClock::new();
    let cache = cache_with(introspector.clone(), clock.clone());

    let graph = cache.graph(None);
    graph.find_path("students", "enrollments");
    assert_eq!(graph.cached_path_count(), 1);

    clock.advance(Duration::hours(2));
    assert_eq!(cache.graph(None).cached_path_count(), 0);
}

#[test]
fn test_concurrent_cold_readers_refresh_once() {
    let introspector = ScriptedIntrospector::new(SCHOOL);
    let cache = cache_with(introspector.clone(), ManualClock::new());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    assert_eq!(cache.schema(None).tables.len(), 3);
                }
            });
        }
    });

    assert_eq!(introspector.calls(), 1);
}

/// Introspector that parks inside `discover` until released
struct GatedIntrospector {
    gated: AtomicBool,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
    generation: AtomicUsize,
}

impl SchemaIntrospector for GatedIntrospector {
    fn discover(&self, _database: &str) -> Result<TableColumns> {
        if self.gated.load(Ordering::SeqCst) {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        Ok([(format!("table_v{}", generation), vec!["id".to_string()])]
            .into_iter()
            .collect())
    }

    fn discover_foreign_keys(&self, _database: &str) -> Result<Vec<ForeignKeyRelation>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_stale_reader_not_blocked_by_refresh() {
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let introspector = Arc::new(GatedIntrospector {
        gated: AtomicBool::new(false),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
        generation: AtomicUsize::new(0),
    });
    let clock = ManualClock::new();
    let cache = SchemaCache::with_clock(introspector.clone(), clock.clone(), &EngineConfig::default());

    assert_eq!(cache.table_names(None), vec!["table_v0"]);
    clock.advance(Duration::hours(2));
    introspector.gated.store(true, Ordering::SeqCst);

    std::thread::scope(|scope| {
        let refresher = scope.spawn(|| cache.table_names(None));
        entered_rx.recv().unwrap();

        // refresh in flight: the stale snapshot is served immediately
        assert_eq!(cache.table_names(None), vec!["table_v0"]);

        release_tx.send(()).unwrap();
        assert_eq!(refresher.join().unwrap(), vec!["table_v1"]);
    });

    assert_eq!(cache.table_names(None), vec!["table_v1"]);
}
